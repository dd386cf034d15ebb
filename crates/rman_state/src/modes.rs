//! Block modes and request validation.
//!
//! The mode stack mirrors the open `...Begin` blocks. Each request is checked
//! against it before its effect is applied.

use std::fmt;

use rman_core::{ErrorCode, Request, RequestClass, Result, RiError, Token, tokens};

/// One level of block nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No context.
    Outside,
    /// Inside `Begin`/`End`, outside of any other block.
    Begin,
    Frame,
    World,
    Attribute,
    Transform,
    Solid,
    Object,
    Motion,
    Archive,
    Resource,
}

impl Mode {
    /// The block mode a `...Begin` request opens.
    #[must_use]
    pub fn opened_by(request: Request) -> Option<Self> {
        Some(match request {
            Request::Begin => Self::Begin,
            Request::FrameBegin => Self::Frame,
            Request::WorldBegin => Self::World,
            Request::AttributeBegin => Self::Attribute,
            Request::TransformBegin => Self::Transform,
            Request::SolidBegin => Self::Solid,
            Request::ObjectBegin => Self::Object,
            Request::MotionBegin => Self::Motion,
            Request::ArchiveBegin => Self::Archive,
            Request::ResourceBegin => Self::Resource,
            _ => return None,
        })
    }

    /// The block mode a `...End` request closes.
    #[must_use]
    pub fn closed_by(request: Request) -> Option<Self> {
        Some(match request {
            Request::End => Self::Begin,
            Request::FrameEnd => Self::Frame,
            Request::WorldEnd => Self::World,
            Request::AttributeEnd => Self::Attribute,
            Request::TransformEnd => Self::Transform,
            Request::SolidEnd => Self::Solid,
            Request::ObjectEnd => Self::Object,
            Request::MotionEnd => Self::Motion,
            Request::ArchiveEnd => Self::Archive,
            Request::ResourceEnd => Self::Resource,
            _ => return None,
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Open motion block: sample times and the calls seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub times: Vec<f32>,
    pub request: Option<Request>,
    pub samples: usize,
}

/// Solid operations accepted by `SolidBegin`.
#[must_use]
pub fn is_solid_operation(op: Token) -> bool {
    [tokens::PRIMITIVE, tokens::INTERSECTION, tokens::UNION, tokens::DIFFERENCE]
        .iter()
        .any(|name| op == *name)
}

/// Requests that may appear inside a motion block.
fn is_motion_request(request: Request) -> bool {
    matches!(
        request.class(),
        RequestClass::Transform | RequestClass::Primitive
    ) || matches!(
        request,
        Request::Color
            | Request::Opacity
            | Request::Surface
            | Request::Displacement
            | Request::Deformation
            | Request::Atmosphere
            | Request::Interior
            | Request::Exterior
            | Request::LightSource
            | Request::AreaLightSource
    )
}

/// Checks `request` against the open blocks `modes` (innermost last).
pub fn validate(modes: &[Mode], motion: Option<&MotionState>, request: Request) -> Result<()> {
    let innermost = modes.last().copied().unwrap_or(Mode::Outside);
    let inside = |mode: Mode| modes.contains(&mode);

    if request.class() == RequestClass::Lifecycle {
        return Ok(());
    }

    // Archive bodies are recorded for later and only checked for nesting.
    if inside(Mode::Archive) && !request.is_block_end() {
        return Ok(());
    }

    if innermost == Mode::Motion && request != Request::MotionEnd {
        if !is_motion_request(request) {
            return Err(RiError::error(
                ErrorCode::BadMotion,
                format!("{request} is not allowed inside a motion block"),
            ));
        }
        if let Some(motion) = motion {
            if let Some(first) = motion.request {
                if first != request {
                    return Err(RiError::error(
                        ErrorCode::BadMotion,
                        format!("motion block mixes {first} and {request}"),
                    ));
                }
            }
            if motion.samples >= motion.times.len() {
                return Err(RiError::error(
                    ErrorCode::BadMotion,
                    format!(
                        "motion block has {} time samples but more calls",
                        motion.times.len()
                    ),
                ));
            }
        }
        return Ok(());
    }

    if let Some(closed) = Mode::closed_by(request) {
        if innermost != closed {
            return Err(RiError::error(
                ErrorCode::Nesting,
                format!("{request} does not close the innermost {innermost} block"),
            ));
        }
        return Ok(());
    }

    match request {
        Request::FrameBegin if inside(Mode::Frame) || inside(Mode::World) => {
            return Err(RiError::error(
                ErrorCode::Nesting,
                "FrameBegin inside a frame or world block",
            ));
        }
        Request::WorldBegin if inside(Mode::World) => {
            return Err(RiError::error(ErrorCode::Nesting, "nested WorldBegin"));
        }
        Request::ObjectBegin if inside(Mode::Object) => {
            return Err(RiError::error(ErrorCode::Nesting, "nested ObjectBegin"));
        }
        _ => {}
    }

    match request.class() {
        RequestClass::Option if inside(Mode::World) || inside(Mode::Object) => {
            Err(RiError::error(
                ErrorCode::NotOptions,
                format!("{request} is an option and not allowed inside a world block"),
            ))
        }
        RequestClass::Primitive
            if !(inside(Mode::World) || inside(Mode::Object) || inside(Mode::Archive)) =>
        {
            Err(RiError::error(
                ErrorCode::NotPrims,
                format!("{request} outside of a world block"),
            ))
        }
        RequestClass::Attribute if inside(Mode::Object) => Err(RiError::error(
            ErrorCode::IllState,
            format!("{request} is not allowed inside an object definition"),
        )),
        RequestClass::Texture if inside(Mode::World) => Err(RiError::error(
            ErrorCode::IllState,
            format!("{request} is not allowed inside a world block"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_must_match_innermost() {
        let modes = [Mode::Begin, Mode::World, Mode::Attribute];
        assert!(validate(&modes, None, Request::AttributeEnd).is_ok());
        let err = validate(&modes, None, Request::WorldEnd).unwrap_err();
        assert_eq!(err.code, ErrorCode::Nesting);
    }

    #[test]
    fn options_and_prims_by_block() {
        let world = [Mode::Begin, Mode::World];
        let begin = [Mode::Begin];
        assert_eq!(
            validate(&world, None, Request::Format).unwrap_err().code,
            ErrorCode::NotOptions
        );
        assert!(validate(&begin, None, Request::Format).is_ok());
        assert_eq!(
            validate(&begin, None, Request::Sphere).unwrap_err().code,
            ErrorCode::NotPrims
        );
        assert!(validate(&world, None, Request::Sphere).is_ok());
    }

    #[test]
    fn archive_bodies_only_check_nesting() {
        let modes = [Mode::Begin, Mode::Archive, Mode::Attribute];
        assert!(validate(&modes, None, Request::Sphere).is_ok());
        assert!(validate(&modes, None, Request::Format).is_ok());
        assert!(validate(&modes, None, Request::AttributeEnd).is_ok());
        assert_eq!(
            validate(&modes, None, Request::ArchiveEnd).unwrap_err().code,
            ErrorCode::Nesting
        );
    }

    #[test]
    fn object_blocks_reject_attributes() {
        let modes = [Mode::Begin, Mode::Object];
        assert!(validate(&modes, None, Request::Polygon).is_ok());
        assert!(validate(&modes, None, Request::Translate).is_ok());
        assert_eq!(
            validate(&modes, None, Request::Surface).unwrap_err().code,
            ErrorCode::IllState
        );
    }

    #[test]
    fn motion_blocks_need_one_kind() {
        let modes = [Mode::Begin, Mode::World, Mode::Motion];
        let mut motion = MotionState {
            times: vec![0.0, 1.0],
            request: None,
            samples: 0,
        };
        assert!(validate(&modes, Some(&motion), Request::Translate).is_ok());
        motion.request = Some(Request::Translate);
        motion.samples = 1;
        assert_eq!(
            validate(&modes, Some(&motion), Request::Rotate).unwrap_err().code,
            ErrorCode::BadMotion
        );
        motion.samples = 2;
        assert_eq!(
            validate(&modes, Some(&motion), Request::Translate).unwrap_err().code,
            ErrorCode::BadMotion
        );
        assert_eq!(
            validate(&modes, Some(&motion), Request::AttributeBegin).unwrap_err().code,
            ErrorCode::BadMotion
        );
    }

    #[test]
    fn archive_bodies_are_not_checked() {
        let modes = [Mode::Begin, Mode::Archive];
        assert!(validate(&modes, None, Request::Sphere).is_ok());
        assert!(validate(&modes, None, Request::Format).is_ok());
        assert_eq!(
            validate(&modes, None, Request::WorldEnd).unwrap_err().code,
            ErrorCode::Nesting
        );
    }

    #[test]
    fn solid_operations() {
        assert!(is_solid_operation(Token::new("union")));
        assert!(!is_solid_operation(Token::new("xor")));
    }
}
