//! The renderer every built-in back end runs on.
//!
//! # Overview
//!
//! [`BaseRenderer`] turns the raw requests of a context into dispatched
//! commands. For each request it
//!
//! 1. binds the parameter list against the context's declarations,
//! 2. validates the request against the open blocks,
//! 3. applies it to the [`RenderState`],
//! 4. records it into every open object or archive definition,
//! 5. runs the back end's `pre`, `do` and `post` callbacks.
//!
//! A back end may ask for object instances, inline archives and procedurals
//! to be expanded ([`Expand`]); it then sees the recorded or generated calls
//! instead of `ObjectInstance`, `ReadArchive` and `Procedural`, and object
//! or archive definitions are hidden from it.

use bitflags::bitflags;
use glam::Vec3;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use rman_core::{
    Bound, DeclarationDictionary, ErrorCode, ObjectHandle, ParamValues, ParameterList, Request,
    RequestClass, Result, RiError, Token, tokens,
};
use rman_scene::{
    CommandSink, NodeId, Phase, Procedural, RenderCallbacks, RiCall, RiCommand, SceneBuilder,
    SceneGraph,
};
use rman_state::{
    ColorSamples, DisplayDesc, Orientation, RenderState, ShaderBinding, ShaderSlot, StateKind,
};

use crate::binding::geometry_counts;
use crate::context::{Handle, RenderContext};

/// Nesting limit for instances, archives and procedurals expanding each other.
pub const MAX_EXPANSION_DEPTH: usize = 64;

/// Declarations every context knows besides the standard ones.
pub const EXTRA_DECLARATIONS: &[(&str, &str)] = &[
    ("operation", "uniform string"),
    ("subset", "uniform string"),
    ("file", "uniform string"),
];

bitflags! {
    /// What a back end wants expanded before it sees the calls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Expand: u8 {
        const OBJECTS     = 1 << 0;
        const ARCHIVES    = 1 << 1;
        const PROCEDURALS = 1 << 2;
    }
}

/// Renderer callbacks plus the lifecycle of the context they run in.
pub trait Backend: RenderCallbacks {
    fn expand(&self) -> Expand {
        Expand::empty()
    }

    fn activate(&mut self) {}

    fn deactivate(&mut self) {}

    fn abort(&mut self) {}

    fn end(&mut self, _state: &RenderState) -> Result<()> {
        Ok(())
    }

    fn control(&mut self, _name: &str, _params: &ParameterList) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// A recorded object or inline archive, including its enclosing
/// `ObjectBegin`/`ObjectEnd` or `ArchiveBegin`/`ArchiveEnd`.
#[derive(Debug)]
pub struct Definition {
    graph: SceneGraph,
    begin: NodeId,
    end: NodeId,
}

impl Definition {
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The recorded calls between the enclosing requests, in capture order.
    pub fn body(&self) -> impl Iterator<Item = &RiCommand> + '_ {
        let (begin, end) = (self.begin, self.end);
        self.graph
            .iter()
            .filter(move |visit| visit.id != begin && visit.id != end)
            .map(|visit| visit.command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Object(ObjectHandle),
    Archive(Token),
}

#[derive(Debug)]
struct Recording {
    target: Target,
    builder: SceneBuilder,
    begin: NodeId,
    end: Option<NodeId>,
}

impl Recording {
    fn start(target: Target, cmd: &RiCommand) -> Self {
        let mut builder = SceneBuilder::new();
        let begin = builder.insert_and_descent(cmd.duplicate());
        Self {
            target,
            builder,
            begin,
            end: None,
        }
    }

    fn insert(&mut self, cmd: &RiCommand) -> Result<()> {
        let request = cmd.request();
        if request.is_block_begin() {
            self.builder.insert_and_descent(cmd.duplicate());
        } else if request.is_block_end() {
            let id = self.builder.insert_and_ascent(cmd.duplicate())?;
            if self.builder.depth() == 0 {
                self.end = Some(id);
            }
        } else {
            self.builder.insert_and_next(cmd.duplicate());
        }
        Ok(())
    }

    fn hides(&self, expand: Expand) -> bool {
        match self.target {
            Target::Object(_) => expand.contains(Expand::OBJECTS),
            Target::Archive(_) => expand.contains(Expand::ARCHIVES),
        }
    }

    fn finish(self) -> Result<(Target, Definition)> {
        let end = self.end.ok_or_else(|| {
            RiError::error(ErrorCode::Nesting, "definition closed before its end")
        })?;
        Ok((
            self.target,
            Definition {
                graph: self.builder.finish()?,
                begin: self.begin,
                end,
            },
        ))
    }
}

// ============================================================================
// Base renderer
// ============================================================================

/// A [`RenderContext`] driving the callbacks of back end `B`.
pub struct BaseRenderer<B: Backend> {
    backend: B,
    state: RenderState,
    dictionary: DeclarationDictionary,
    recordings: Vec<Recording>,
    objects: FxHashMap<ObjectHandle, Definition>,
    archives: FxHashMap<Token, Definition>,
    deferred: Vec<RiError>,
    expansion_depth: usize,
}

impl<B: Backend> BaseRenderer<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        let mut dictionary = DeclarationDictionary::with_standard_declarations();
        for &(name, decl) in EXTRA_DECLARATIONS {
            if let Err(err) = dictionary.declare(name, decl, true) {
                warn!("Bad declaration {name}: {err}");
            }
        }
        Self {
            backend,
            state: RenderState::new(),
            dictionary,
            recordings: Vec::new(),
            objects: FxHashMap::default(),
            archives: FxHashMap::default(),
            deferred: Vec::new(),
            expansion_depth: 0,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[must_use]
    pub fn dictionary(&self) -> &DeclarationDictionary {
        &self.dictionary
    }

    #[must_use]
    pub fn object(&self, handle: ObjectHandle) -> Option<&Definition> {
        self.objects.get(&handle)
    }

    #[must_use]
    pub fn archive(&self, name: &str) -> Option<&Definition> {
        self.archives.get(&Token::new(name))
    }

    /// Binds the parameter list of `call`. Failed pairs are left out and
    /// kept as deferred diagnostics.
    fn bind(&mut self, call: &mut RiCall, tokens: &[Token], values: &[ParamValues<'_>]) -> Result<()> {
        if call.params().is_none() {
            return Ok(());
        }
        let counts = geometry_counts(call, &self.state, tokens, values)?;
        let color_components = self.state.color_components();
        if let Some(params) = call.params_mut() {
            params.set(&mut self.dictionary, &counts, color_components, tokens, values);
            let line = self.state.line();
            while let Some(err) = params.take_bind_error() {
                self.deferred.push(err.at_line(line));
            }
        }
        Ok(())
    }

    /// Validates, applies, records and dispatches one command.
    pub fn execute(&mut self, mut cmd: RiCommand) -> Result<Option<Handle>> {
        let request = cmd.request();
        self.state.set_line(cmd.line);
        self.state
            .validate(request)
            .map_err(|err| err.at_line(cmd.line))?;
        let handle = self.apply(&mut cmd.call)?;
        if request != Request::MotionBegin {
            self.state.note_motion_sample(request);
        }

        let expand = self.backend.expand();
        let hidden_before = self.is_hidden(expand);
        self.record(&cmd)?;
        if hidden_before || self.is_hidden(expand) {
            return Ok(handle);
        }

        cmd.process(Phase::Pre, &mut self.backend, &self.state)?;
        self.perform(&cmd, expand)?;
        cmd.process(Phase::Post, &mut self.backend, &self.state)?;
        Ok(handle)
    }

    fn is_hidden(&self, expand: Expand) -> bool {
        self.recordings.iter().any(|r| r.hides(expand))
    }

    fn record(&mut self, cmd: &RiCommand) -> Result<()> {
        for recording in &mut self.recordings {
            recording.insert(cmd)?;
        }
        match &cmd.call {
            RiCall::ObjectBegin { handle } => {
                self.recordings
                    .push(Recording::start(Target::Object(*handle), cmd));
            }
            RiCall::ArchiveBegin { name, .. } => {
                self.recordings
                    .push(Recording::start(Target::Archive(*name), cmd));
            }
            _ => {}
        }
        if self.recordings.last().is_some_and(|r| r.end.is_some()) {
            if let Some(recording) = self.recordings.pop() {
                let (target, definition) = recording.finish()?;
                match target {
                    Target::Object(handle) => {
                        debug!("Recorded object {handle}");
                        self.objects.insert(handle, definition);
                    }
                    Target::Archive(name) => {
                        debug!("Recorded archive \"{name}\"");
                        self.archives.insert(name, definition);
                    }
                }
            }
        }
        Ok(())
    }

    /// The `do` phase, or the expansion that replaces it.
    fn perform(&mut self, cmd: &RiCommand, expand: Expand) -> Result<()> {
        match &cmd.call {
            RiCall::ObjectInstance { handle } if expand.contains(Expand::OBJECTS) => {
                let body = self
                    .objects
                    .get(handle)
                    .map(|def| def.body().cloned().collect::<Vec<_>>())
                    .ok_or_else(|| {
                        RiError::error(ErrorCode::BadHandle, format!("unknown object {handle}"))
                    })?;
                debug!("Instancing object {handle} ({} calls)", body.len());
                self.replay(body, true)
            }
            RiCall::ReadArchive { name, .. } if expand.contains(Expand::ARCHIVES) => {
                let body = self
                    .archives
                    .get(name)
                    .map(|def| def.body().cloned().collect::<Vec<_>>())
                    .ok_or_else(|| {
                        RiError::error(ErrorCode::NoFile, format!("archive \"{name}\" not found"))
                    })?;
                debug!("Reading archive \"{name}\" ({} calls)", body.len());
                self.replay(body, false)
            }
            RiCall::Procedural { procedural, bound } if expand.contains(Expand::PROCEDURALS) => {
                self.expand_procedural(procedural, bound)
            }
            _ => cmd.process(Phase::Do, &mut self.backend, &self.state),
        }
    }

    fn enter_expansion(&mut self) -> Result<()> {
        if self.expansion_depth >= MAX_EXPANSION_DEPTH {
            return Err(RiError::error(
                ErrorCode::Limit,
                format!("expansion nested deeper than {MAX_EXPANSION_DEPTH}"),
            ));
        }
        self.expansion_depth += 1;
        Ok(())
    }

    /// Runs recorded calls; object instances keep the caller's transform.
    fn replay(&mut self, body: Vec<RiCommand>, keep_transform: bool) -> Result<()> {
        self.enter_expansion()?;
        let saved = keep_transform.then(|| self.state.snapshot(StateKind::Transform));
        let result = body
            .into_iter()
            .try_for_each(|cmd| self.execute(cmd).map(|_| ()));
        self.expansion_depth -= 1;
        if let Some(saved) = saved {
            self.state.restore(saved.as_ref())?;
        }
        result
    }

    fn expand_procedural(&mut self, procedural: &Procedural, bound: &Bound) -> Result<()> {
        self.enter_expansion()?;
        let detail = bound_detail(bound);
        debug!("Expanding procedural {} at detail {detail}", procedural.name());
        self.state.attribute_begin();
        let result = procedural.subdivide(detail, &mut Expansion { renderer: self });
        procedural.free();
        let closed = self.state.attribute_end();
        self.expansion_depth -= 1;
        result.and(closed)
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Applies `call` to the graphics state and assigns the handles it
    /// creates.
    fn apply(&mut self, call: &mut RiCall) -> Result<Option<Handle>> {
        let state = &mut self.state;
        match call {
            RiCall::FrameBegin { number } => state.frame_begin(*number),
            RiCall::FrameEnd {} => state.frame_end()?,
            RiCall::WorldBegin {} => state.world_begin(),
            RiCall::WorldEnd {} => state.world_end()?,
            RiCall::AttributeBegin {} => state.attribute_begin(),
            RiCall::AttributeEnd {} => state.attribute_end()?,
            RiCall::TransformBegin {} => state.transform_begin(),
            RiCall::TransformEnd {} => state.transform_end()?,
            RiCall::SolidBegin { operation } => state.solid_begin(*operation)?,
            RiCall::SolidEnd {} => state.solid_end()?,
            RiCall::ObjectBegin { handle } => {
                *handle = state.object_begin();
                return Ok(Some(Handle::Object(*handle)));
            }
            RiCall::ObjectEnd {} => {
                let handle = self
                    .recordings
                    .iter()
                    .rev()
                    .find_map(|r| match r.target {
                        Target::Object(handle) => Some(handle),
                        Target::Archive(_) => None,
                    })
                    .unwrap_or(ObjectHandle::ILLEGAL);
                state.object_end(handle)?;
            }
            RiCall::MotionBegin { times } => state.motion_begin(times)?,
            RiCall::MotionEnd {} => state.motion_end()?,
            RiCall::ArchiveBegin { name, .. } => {
                return Ok(Some(Handle::Archive(state.archive_begin(*name))));
            }
            RiCall::ArchiveEnd {} => state.archive_end()?,
            RiCall::ResourceBegin {} => state.resource_begin(),
            RiCall::ResourceEnd {} => state.resource_end()?,
            RiCall::LightSource { name, handle, .. } => {
                *handle = state.new_light(*name);
                return Ok(Some(Handle::Light(*handle)));
            }
            RiCall::AreaLightSource { name, handle, .. } => {
                *handle = state.new_light(*name);
                if state.applies_state() {
                    state.attributes_mut().area_light = Some(*handle);
                }
                return Ok(Some(Handle::Light(*handle)));
            }
            RiCall::Declare { name, declaration } => {
                self.dictionary.declare(name.as_str(), declaration, false)?;
            }
            RiCall::Resource { name, ty, params } if state.applies_state() => {
                apply_resource(state, *name, *ty, params)?;
            }
            RiCall::ObjectInstance { handle } if !state.has_object(*handle) => {
                return Err(RiError::error(
                    ErrorCode::BadHandle,
                    format!("unknown object {handle}"),
                ));
            }
            _ if !state.applies_state() => {}
            call if call.request().class() == RequestClass::Option => apply_option(state, call)?,
            call => apply_attribute(state, call)?,
        }
        Ok(None)
    }
}

fn apply_resource(state: &mut RenderState, name: Token, ty: Token, params: &ParameterList) -> Result<()> {
    if ty.as_str() != "attributes" {
        return Err(RiError::error(
            ErrorCode::BadToken,
            format!("unknown resource type \"{ty}\""),
        ));
    }
    let operation = params.string("operation").unwrap_or("save");
    state.attribute_resource(name, operation)
}

fn apply_option(state: &mut RenderState, call: &RiCall) -> Result<()> {
    let options = state.options_mut();
    match call {
        RiCall::Format {
            x_resolution,
            y_resolution,
            pixel_aspect,
        } => options.set_format(*x_resolution, *y_resolution, *pixel_aspect)?,
        RiCall::FrameAspectRatio { ratio } => {
            if *ratio <= 0.0 {
                return Err(RiError::error(
                    ErrorCode::Range,
                    format!("FrameAspectRatio {ratio} must be positive"),
                ));
            }
            options.frame_aspect_ratio = Some(*ratio);
        }
        RiCall::ScreenWindow {
            left,
            right,
            bottom,
            top,
        } => options.screen_window = Some([*left, *right, *bottom, *top]),
        RiCall::CropWindow {
            xmin,
            xmax,
            ymin,
            ymax,
        } => options.set_crop_window([*xmin, *xmax, *ymin, *ymax])?,
        RiCall::Projection { name, params } => {
            options.projection = *name;
            options.projection_params = params.clone();
        }
        RiCall::Clipping { near, far } => options.set_clipping(*near, *far)?,
        RiCall::ClippingPlane { x, y, z, nx, ny, nz } => {
            options.clipping_planes.push([*x, *y, *z, *nx, *ny, *nz]);
        }
        RiCall::DepthOfField {
            fstop,
            focal_length,
            focal_distance,
        } => options.depth_of_field = Some([*fstop, *focal_length, *focal_distance]),
        RiCall::Shutter { open, close } => options.set_shutter(*open, *close)?,
        RiCall::PixelVariance { variance } => options.pixel_variance = *variance,
        RiCall::PixelSamples { xsamples, ysamples } => {
            options.set_pixel_samples(*xsamples, *ysamples)?;
        }
        RiCall::PixelFilter {
            filter,
            xwidth,
            ywidth,
        } => options.pixel_filter = (*filter, *xwidth, *ywidth),
        RiCall::Exposure { gain, gamma } => options.exposure = (*gain, *gamma),
        RiCall::Imager { name, params } => {
            options.imager = Some(ShaderBinding {
                name: *name,
                params: params.clone(),
            });
        }
        RiCall::Quantize {
            ty,
            one,
            min,
            max,
            dither_amplitude,
        } => {
            options
                .quantize
                .insert(*ty, [*one as f32, *min as f32, *max as f32, *dither_amplitude]);
        }
        RiCall::Display {
            name,
            ty,
            mode,
            params,
        } => {
            // a leading '+' adds a display instead of replacing them
            if !name.starts_with('+') {
                options.displays.clear();
            }
            options.displays.push(DisplayDesc {
                name: name.clone(),
                ty: *ty,
                mode: *mode,
                params: params.clone(),
            });
        }
        RiCall::Hider { ty, params } => {
            options.hider = *ty;
            options.hider_params = params.clone();
        }
        RiCall::ColorSamples { n_rgb, rgb_n } => {
            let n = n_rgb.len() / 3;
            options.color_samples = ColorSamples::new(n, n_rgb, rgb_n)?;
            state.attributes_mut().resize_colors(n);
        }
        RiCall::RelativeDetail { relative_detail } => options.relative_detail = *relative_detail,
        RiCall::Option { name, params } => {
            options.user.entry(*name).or_default().merge(params);
        }
        _ => {}
    }
    Ok(())
}

fn apply_attribute(state: &mut RenderState, call: &RiCall) -> Result<()> {
    let color_components = state.color_components();
    match call {
        RiCall::Attribute { name, params } => {
            state.attributes_mut().user.entry(*name).or_default().merge(params);
        }
        RiCall::Color { color } => state.attributes_mut().set_color(color, color_components)?,
        RiCall::Opacity { opacity } => {
            state.attributes_mut().set_opacity(opacity, color_components)?;
        }
        RiCall::TextureCoordinates {
            s1,
            t1,
            s2,
            t2,
            s3,
            t3,
            s4,
            t4,
        } => state.attributes_mut().texture_coordinates = [*s1, *t1, *s2, *t2, *s3, *t3, *s4, *t4],
        RiCall::Illuminate { light, on } => state.illuminate(*light, *on)?,
        RiCall::Surface { name, params } => set_shader(state, ShaderSlot::Surface, *name, params),
        RiCall::Atmosphere { name, params } => {
            set_shader(state, ShaderSlot::Atmosphere, *name, params);
        }
        RiCall::Interior { name, params } => set_shader(state, ShaderSlot::Interior, *name, params),
        RiCall::Exterior { name, params } => set_shader(state, ShaderSlot::Exterior, *name, params),
        RiCall::Displacement { name, params } => {
            set_shader(state, ShaderSlot::Displacement, *name, params);
        }
        RiCall::Deformation { name, params } => {
            set_shader(state, ShaderSlot::Deformation, *name, params);
        }
        RiCall::ShadingRate { size } => state.attributes_mut().set_shading_rate(*size)?,
        RiCall::ShadingInterpolation { ty } => {
            if !matches!(ty.as_str(), tokens::CONSTANT | tokens::SMOOTH) {
                return Err(RiError::error(
                    ErrorCode::BadToken,
                    format!("unknown shading interpolation \"{ty}\""),
                ));
            }
            state.attributes_mut().shading_interpolation = *ty;
        }
        RiCall::Matte { on } => state.attributes_mut().matte = *on,
        RiCall::Bound { bound } => state.attributes_mut().bound = Some(*bound),
        RiCall::Detail { bound } => state.attributes_mut().detail = Some(*bound),
        RiCall::DetailRange {
            min_visible,
            lower_transition,
            upper_transition,
            max_visible,
        } => state.attributes_mut().set_detail_range([
            *min_visible,
            *lower_transition,
            *upper_transition,
            *max_visible,
        ])?,
        RiCall::GeometricApproximation { ty, value } => {
            state
                .attributes_mut()
                .geometric_approximation
                .insert(*ty, *value);
        }
        RiCall::Orientation { orientation } => {
            let parsed = Orientation::parse(orientation.as_str()).ok_or_else(|| {
                RiError::error(
                    ErrorCode::BadToken,
                    format!("unknown orientation \"{orientation}\""),
                )
            })?;
            state.attributes_mut().orientation = parsed;
        }
        RiCall::ReverseOrientation {} => {
            let attributes = state.attributes_mut();
            attributes.orientation = attributes.orientation.reversed();
        }
        RiCall::Sides { sides } => state.attributes_mut().set_sides(*sides)?,
        RiCall::Basis { u_basis, v_basis } => {
            let attributes = state.attributes_mut();
            attributes.u_basis = *u_basis;
            attributes.v_basis = *v_basis;
        }
        RiCall::TrimCurve { curve } => state.attributes_mut().set_trim_curve(curve.clone())?,

        RiCall::Identity {} => state.transform_mut().identity(),
        RiCall::Transform { matrix } => state.transform_mut().set(*matrix)?,
        RiCall::ConcatTransform { matrix } => state.transform_mut().concat(*matrix)?,
        RiCall::Perspective { fov } => state.transform_mut().perspective(*fov)?,
        RiCall::Translate { dx, dy, dz } => {
            state.transform_mut().translate(Vec3::new(*dx, *dy, *dz));
        }
        RiCall::Rotate { angle, dx, dy, dz } => {
            state
                .transform_mut()
                .rotate(*angle, Vec3::new(*dx, *dy, *dz))?;
        }
        RiCall::Scale { sx, sy, sz } => state.transform_mut().scale(Vec3::new(*sx, *sy, *sz))?,
        RiCall::Skew {
            angle,
            dx1,
            dy1,
            dz1,
            dx2,
            dy2,
            dz2,
        } => state.transform_mut().skew(
            *angle,
            Vec3::new(*dx1, *dy1, *dz1),
            Vec3::new(*dx2, *dy2, *dz2),
        )?,
        RiCall::CoordinateSystem { space } => state.coordinate_system(*space),
        RiCall::ScopedCoordinateSystem { space } => state.scoped_coordinate_system(*space),
        RiCall::CoordSysTransform { space } => state.coord_sys_transform(*space)?,
        _ => {}
    }
    Ok(())
}

fn set_shader(state: &mut RenderState, slot: ShaderSlot, name: Token, params: &ParameterList) {
    state
        .attributes_mut()
        .set_shader(slot, name, params.clone());
}

/// Level of detail handed to subdividers: the diagonal of the bound.
fn bound_detail(bound: &Bound) -> f32 {
    let min = Vec3::new(bound[0], bound[2], bound[4]);
    let max = Vec3::new(bound[1], bound[3], bound[5]);
    min.distance(max)
}

/// Feeds the calls of a subdividing procedural back into the renderer.
struct Expansion<'a, B: Backend> {
    renderer: &'a mut BaseRenderer<B>,
}

impl<B: Backend> CommandSink for Expansion<'_, B> {
    fn emit(&mut self, call: RiCall) -> Result<()> {
        let line = self.renderer.state.line();
        self.renderer
            .execute(RiCommand::new(call).with_line(line))
            .map(|_| ())
    }
}

impl<B: Backend> RenderContext for BaseRenderer<B> {
    fn activate(&mut self) {
        self.backend.activate();
    }

    fn deactivate(&mut self) {
        self.backend.deactivate();
    }

    fn abort(&mut self) {
        self.backend.abort();
    }

    fn end(&mut self) -> Result<()> {
        if !self.recordings.is_empty() {
            warn!("{} definitions left open at End", self.recordings.len());
            self.recordings.clear();
        }
        if self.state.modes().len() > 1 {
            warn!("End with open blocks {:?}", &self.state.modes()[1..]);
        }
        let result = self.backend.end(&self.state);
        self.state.unwind();
        result
    }

    fn request(
        &mut self,
        mut call: RiCall,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<Option<Handle>> {
        self.bind(&mut call, tokens, values)?;
        self.execute(RiCommand::new(call))
    }

    fn control(&mut self, name: &str, params: &ParameterList) -> Result<()> {
        self.backend.control(name, params)
    }

    fn take_deferred(&mut self) -> Vec<RiError> {
        std::mem::take(&mut self.deferred)
    }
}
