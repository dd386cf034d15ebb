//! Render State
//!
//! The complete graphics state of one rendering context.
//!
//! # Overview
//!
//! [`RenderState`] combines three independent stacks:
//!
//! - the **mode stack** of open blocks, used for validation,
//! - the **option stack**, pushed by `FrameBegin`,
//! - the **attribute stack**, pushed by `FrameBegin`, `WorldBegin`,
//!   `AttributeBegin`, `SolidBegin` and `ObjectBegin`.
//!
//! The transformation is part of the attributes. `TransformBegin` saves only
//! the transformation on a separate save list and `TransformEnd` restores it
//! into whatever attribute frame is current.
//!
//! Inside an inline archive, blocks only open and close modes. The body is
//! recorded for later replay and never touches the live stacks.
//!
//! Besides the stacks, the state owns the handle allocators for lights,
//! objects and archives and the named coordinate systems.

use rustc_hash::{FxHashMap, FxHashSet};

use rman_core::{
    ArchiveHandle, ErrorCode, HandleCounter, LightHandle, ObjectHandle, Request, Result, RiError,
    Token,
};

use crate::attributes::Attributes;
use crate::modes::{self, Mode, MotionState};
use crate::options::Options;
use crate::stack::{StateKind, StateRecord, StateStack};
use crate::transform::TransformState;

/// Graphics state of one context.
#[derive(Debug, Clone)]
pub struct RenderState {
    modes: Vec<Mode>,
    options: StateStack<Options>,
    attributes: StateStack<Attributes>,
    transform_saves: Vec<TransformState>,
    motion: Option<MotionState>,
    solid_operations: Vec<Token>,

    coordinate_systems: FxHashMap<Token, TransformState>,
    /// Saved attribute sets of `Resource name "attributes"`, one map per resource block.
    resources: Vec<FxHashMap<Token, Attributes>>,

    light_handles: HandleCounter,
    object_handles: HandleCounter,
    archive_handles: HandleCounter,
    lights: FxHashMap<LightHandle, Token>,
    objects: FxHashSet<ObjectHandle>,
    archives: FxHashMap<Token, ArchiveHandle>,

    frame_number: Option<i32>,
    line: i64,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    /// A state in `Begin` mode with default options and attributes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modes: vec![Mode::Begin],
            options: StateStack::default(),
            attributes: StateStack::default(),
            transform_saves: Vec::new(),
            motion: None,
            solid_operations: Vec::new(),
            coordinate_systems: FxHashMap::default(),
            resources: vec![FxHashMap::default()],
            light_handles: HandleCounter::new(),
            object_handles: HandleCounter::new(),
            archive_handles: HandleCounter::new(),
            lights: FxHashMap::default(),
            objects: FxHashSet::default(),
            archives: FxHashMap::default(),
            frame_number: None,
            line: -1,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn options(&self) -> &Options {
        self.options.top()
    }

    #[inline]
    pub fn options_mut(&mut self) -> &mut Options {
        self.options.top_mut()
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        self.attributes.top()
    }

    #[inline]
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes.top_mut()
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &TransformState {
        &self.attributes.top().transform
    }

    #[inline]
    pub fn transform_mut(&mut self) -> &mut TransformState {
        &mut self.attributes.top_mut().transform
    }

    #[inline]
    #[must_use]
    pub fn color_components(&self) -> usize {
        self.options().color_components()
    }

    /// Innermost open block.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Outside)
    }

    /// Open blocks, outermost first.
    #[must_use]
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    #[must_use]
    pub fn is_inside(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    #[must_use]
    pub fn attribute_depth(&self) -> usize {
        self.attributes.depth()
    }

    #[must_use]
    pub fn option_depth(&self) -> usize {
        self.options.depth()
    }

    #[must_use]
    pub fn motion(&self) -> Option<&MotionState> {
        self.motion.as_ref()
    }

    #[must_use]
    pub fn solid_operation(&self) -> Option<Token> {
        self.solid_operations.last().copied()
    }

    #[must_use]
    pub fn frame_number(&self) -> Option<i32> {
        self.frame_number
    }

    /// Source line of the request being processed, `-1` if unknown.
    #[must_use]
    pub fn line(&self) -> i64 {
        self.line
    }

    pub fn set_line(&mut self, line: i64) {
        self.line = line;
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Checks whether `request` is legal in the current block structure.
    pub fn validate(&self, request: Request) -> Result<()> {
        modes::validate(&self.modes, self.motion.as_ref(), request)
    }

    /// Counts one call of a motion block.
    pub fn note_motion_sample(&mut self, request: Request) {
        if self.mode() == Mode::Motion {
            if let Some(motion) = &mut self.motion {
                motion.request.get_or_insert(request);
                motion.samples += 1;
            }
        }
    }

    /// Whether transform and attribute requests take effect.
    ///
    /// Only the first sample of a motion block updates the state.
    #[must_use]
    pub fn applies_state(&self) -> bool {
        !(self.mode() == Mode::Motion
            && self.motion.as_ref().is_some_and(|m| m.samples > 0))
            && !self.in_archive()
    }

    /// Whether an inline archive is being recorded. Archive bodies are
    /// validated but leave the option, attribute and transform stacks alone.
    #[must_use]
    pub fn in_archive(&self) -> bool {
        self.is_inside(Mode::Archive)
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    pub fn frame_begin(&mut self, number: i32) {
        self.modes.push(Mode::Frame);
        if self.in_archive() {
            return;
        }
        self.options.push();
        self.attributes.push();
        self.frame_number = Some(number);
    }

    pub fn frame_end(&mut self) -> Result<()> {
        self.close(Mode::Frame)?;
        if self.in_archive() {
            return Ok(());
        }
        self.attributes.pop()?;
        self.options.pop()?;
        self.frame_number = None;
        Ok(())
    }

    /// Enters the world. The current transformation becomes the camera
    /// transformation and the world starts with the identity.
    pub fn world_begin(&mut self) {
        if self.in_archive() {
            self.modes.push(Mode::World);
            return;
        }
        let camera = *self.transform();
        self.coordinate_systems
            .insert(Token::new(rman_core::tokens::CAMERA), camera);
        self.modes.push(Mode::World);
        self.attributes.push();
        self.transform_mut().identity();
        self.coordinate_systems
            .insert(Token::new(rman_core::tokens::WORLD), TransformState::IDENTITY);
    }

    pub fn world_end(&mut self) -> Result<()> {
        self.close(Mode::World)?;
        self.pop_attributes()
    }

    pub fn attribute_begin(&mut self) {
        self.modes.push(Mode::Attribute);
        self.push_attributes();
    }

    pub fn attribute_end(&mut self) -> Result<()> {
        self.close(Mode::Attribute)?;
        self.pop_attributes()
    }

    pub fn transform_begin(&mut self) {
        self.modes.push(Mode::Transform);
        if !self.in_archive() {
            let saved = *self.transform();
            self.transform_saves.push(saved);
        }
    }

    pub fn transform_end(&mut self) -> Result<()> {
        self.close(Mode::Transform)?;
        if self.in_archive() {
            return Ok(());
        }
        let saved = self.transform_saves.pop().ok_or_else(|| {
            RiError::error(ErrorCode::Nesting, "transform stack underflow")
        })?;
        *self.transform_mut() = saved;
        Ok(())
    }

    pub fn solid_begin(&mut self, operation: Token) -> Result<()> {
        if !modes::is_solid_operation(operation) {
            return Err(RiError::error(
                ErrorCode::BadSolid,
                format!("unknown solid operation \"{operation}\""),
            ));
        }
        self.modes.push(Mode::Solid);
        self.push_attributes();
        self.solid_operations.push(operation);
        Ok(())
    }

    pub fn solid_end(&mut self) -> Result<()> {
        self.close(Mode::Solid)?;
        self.solid_operations.pop();
        self.pop_attributes()
    }

    /// Opens an object definition and returns its handle.
    pub fn object_begin(&mut self) -> ObjectHandle {
        let handle = ObjectHandle(self.object_handles.next_raw());
        self.modes.push(Mode::Object);
        self.push_attributes();
        handle
    }

    /// Closes an object definition and registers `handle` as instantiable.
    pub fn object_end(&mut self, handle: ObjectHandle) -> Result<()> {
        self.close(Mode::Object)?;
        self.pop_attributes()?;
        if handle.is_valid() {
            self.objects.insert(handle);
        }
        Ok(())
    }

    #[must_use]
    pub fn has_object(&self, handle: ObjectHandle) -> bool {
        self.objects.contains(&handle)
    }

    pub fn motion_begin(&mut self, times: &[f32]) -> Result<()> {
        if times.is_empty() {
            return Err(RiError::error(ErrorCode::BadMotion, "MotionBegin without times"));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(RiError::error(
                ErrorCode::BadMotion,
                "MotionBegin times must be ascending",
            ));
        }
        self.modes.push(Mode::Motion);
        self.motion = Some(MotionState {
            times: times.to_vec(),
            request: None,
            samples: 0,
        });
        Ok(())
    }

    /// Closes a motion block; reports `BadMotion` if samples are missing.
    pub fn motion_end(&mut self) -> Result<()> {
        self.close(Mode::Motion)?;
        let motion = self.motion.take();
        if let Some(motion) = motion {
            if motion.samples != motion.times.len() {
                return Err(RiError::error(
                    ErrorCode::BadMotion,
                    format!(
                        "motion block has {} time samples but {} calls",
                        motion.times.len(),
                        motion.samples
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Opens an inline archive and returns its handle.
    pub fn archive_begin(&mut self, name: Token) -> ArchiveHandle {
        let handle = ArchiveHandle(self.archive_handles.next_raw());
        self.modes.push(Mode::Archive);
        self.archives.insert(name, handle);
        handle
    }

    pub fn archive_end(&mut self) -> Result<()> {
        self.close(Mode::Archive)
    }

    #[must_use]
    pub fn archive(&self, name: Token) -> Option<ArchiveHandle> {
        self.archives.get(&name).copied()
    }

    pub fn resource_begin(&mut self) {
        self.modes.push(Mode::Resource);
        self.resources.push(FxHashMap::default());
    }

    pub fn resource_end(&mut self) -> Result<()> {
        self.close(Mode::Resource)?;
        self.resources.pop();
        Ok(())
    }

    fn push_attributes(&mut self) {
        if !self.in_archive() {
            self.attributes.push();
        }
    }

    fn pop_attributes(&mut self) -> Result<()> {
        if self.in_archive() {
            return Ok(());
        }
        self.attributes.pop()
    }

    fn close(&mut self, mode: Mode) -> Result<()> {
        if self.mode() != mode {
            return Err(RiError::error(
                ErrorCode::Nesting,
                format!("cannot close {mode} block, innermost is {}", self.mode()),
            ));
        }
        self.modes.pop();
        Ok(())
    }

    /// Closes every open block, e.g. on `End` or abort.
    pub fn unwind(&mut self) {
        self.modes.truncate(1);
        self.options.unwind();
        self.attributes.unwind();
        self.transform_saves.clear();
        self.motion = None;
        self.solid_operations.clear();
        self.resources.truncate(1);
    }

    // ========================================================================
    // Handles & named state
    // ========================================================================

    /// Allocates a handle for a new light source.
    pub fn new_light(&mut self, shader: Token) -> LightHandle {
        let handle = LightHandle(self.light_handles.next_raw());
        self.lights.insert(handle, shader);
        if !self.in_archive() {
            self.attributes_mut().illuminated.insert(handle, true);
        }
        handle
    }

    /// Switches a light on or off for subsequent primitives.
    pub fn illuminate(&mut self, light: LightHandle, on: bool) -> Result<()> {
        if !self.lights.contains_key(&light) {
            return Err(RiError::error(
                ErrorCode::BadHandle,
                format!("unknown light handle {light}"),
            ));
        }
        self.attributes_mut().illuminated.insert(light, on);
        Ok(())
    }

    #[must_use]
    pub fn light_shader(&self, light: LightHandle) -> Option<Token> {
        self.lights.get(&light).copied()
    }

    /// Names the current transformation.
    pub fn coordinate_system(&mut self, name: Token) {
        let current = *self.transform();
        self.coordinate_systems.insert(name, current);
    }

    /// Names the current transformation for the enclosing attribute block only.
    pub fn scoped_coordinate_system(&mut self, name: Token) {
        let current = *self.transform();
        self.attributes_mut()
            .scoped_coordinate_systems
            .insert(name, current);
    }

    /// Replaces the current transformation with a named one.
    pub fn coord_sys_transform(&mut self, name: Token) -> Result<()> {
        let found = self
            .attributes()
            .scoped_coordinate_systems
            .get(&name)
            .or_else(|| self.coordinate_systems.get(&name))
            .copied()
            .ok_or_else(|| {
                RiError::error(
                    ErrorCode::BadToken,
                    format!("unknown coordinate system \"{name}\""),
                )
            })?;
        *self.transform_mut() = found;
        Ok(())
    }

    #[must_use]
    pub fn named_coordinate_system(&self, name: Token) -> Option<&TransformState> {
        self.attributes()
            .scoped_coordinate_systems
            .get(&name)
            .or_else(|| self.coordinate_systems.get(&name))
    }

    /// `Resource` requests of type `"attributes"`: `"save"` stores the current
    /// attributes under `name`, `"restore"` assigns them back.
    pub fn attribute_resource(&mut self, name: Token, operation: &str) -> Result<()> {
        match operation {
            "save" => {
                let saved = self.attributes().clone();
                if let Some(scope) = self.resources.last_mut() {
                    scope.insert(name, saved);
                }
                Ok(())
            }
            "restore" => {
                let saved = self
                    .resources
                    .iter()
                    .rev()
                    .find_map(|scope| scope.get(&name))
                    .map(|saved| saved.duplicate())
                    .ok_or_else(|| {
                        RiError::error(
                            ErrorCode::BadHandle,
                            format!("unknown attribute resource \"{name}\""),
                        )
                    })?;
                self.restore(saved.as_ref())
            }
            other => Err(RiError::error(
                ErrorCode::BadToken,
                format!("unknown resource operation \"{other}\""),
            )),
        }
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Deep copy of one of the current records.
    #[must_use]
    pub fn snapshot(&self, kind: StateKind) -> Box<dyn StateRecord> {
        match kind {
            StateKind::Options => self.options().duplicate(),
            StateKind::Attributes => self.attributes().duplicate(),
            StateKind::Transform => self.transform().duplicate(),
        }
    }

    /// Assigns a snapshot back to the current record of the same kind.
    pub fn restore(&mut self, record: &dyn StateRecord) -> Result<()> {
        match record.kind() {
            StateKind::Options => self.options_mut().assign(record),
            StateKind::Attributes => self.attributes_mut().assign(record),
            StateKind::Transform => self.transform_mut().assign(record),
        }
    }
}
