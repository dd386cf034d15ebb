//! Command objects.
//!
//! A [`RiCommand`] is one captured interface call: the [`RiCall`] variant with
//! its arguments plus the source line it came from. Commands are plain values;
//! [`RiCommand::duplicate`] is a deep copy that shares nothing with the
//! original.

use bitflags::bitflags;

use rman_core::{ParameterList, Request, RequestClass, Result};
use rman_state::RenderState;

use crate::calls::{Phase, RenderCallbacks, RiCall};

bitflags! {
    /// Capability set of a command, queried with [`RiCommand::is_kind_of`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandKind: u32 {
        const BLOCK_BEGIN = 1 << 0;
        const BLOCK_END   = 1 << 1;
        const OPTION      = 1 << 2;
        const ATTRIBUTE   = 1 << 3;
        const TRANSFORM   = 1 << 4;
        const PRIMITIVE   = 1 << 5;
        const TEXTURE     = 1 << 6;
        const UTILITY     = 1 << 7;
        /// Carries a trailing parameter list.
        const VAR_PARAMS  = 1 << 8;
        /// Binds a shader to a slot.
        const SHADER      = 1 << 9;
        /// Creates a light source.
        const LIGHT       = 1 << 10;
        const BLOCK       = Self::BLOCK_BEGIN.bits() | Self::BLOCK_END.bits();
    }
}

/// A captured interface call.
#[derive(Debug, Clone, PartialEq)]
pub struct RiCommand {
    /// Source line, `-1` if unknown.
    pub line: i64,
    pub call: RiCall,
}

impl From<RiCall> for RiCommand {
    fn from(call: RiCall) -> Self {
        Self::new(call)
    }
}

impl RiCommand {
    #[must_use]
    pub fn new(call: RiCall) -> Self {
        Self { line: -1, call }
    }

    #[must_use]
    pub fn with_line(mut self, line: i64) -> Self {
        self.line = line;
        self
    }

    /// Deep copy.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    #[inline]
    #[must_use]
    pub fn request(&self) -> Request {
        self.call.request()
    }

    /// The RIB keyword, e.g. `"Surface"`.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.request().name()
    }

    /// Exact type match.
    #[must_use]
    pub fn is_a(&self, request: Request) -> bool {
        self.request() == request
    }

    /// Whether the command has every capability in `kind`.
    #[must_use]
    pub fn is_kind_of(&self, kind: CommandKind) -> bool {
        self.kinds().contains(kind)
    }

    #[must_use]
    pub fn kinds(&self) -> CommandKind {
        let request = self.request();
        let mut kinds = match request.class() {
            RequestClass::Option => CommandKind::OPTION,
            RequestClass::Attribute => CommandKind::ATTRIBUTE,
            RequestClass::Transform => CommandKind::TRANSFORM,
            RequestClass::Primitive => CommandKind::PRIMITIVE,
            RequestClass::Texture => CommandKind::TEXTURE,
            RequestClass::Block | RequestClass::Lifecycle | RequestClass::Utility => {
                CommandKind::UTILITY
            }
        };
        if request.is_block_begin() {
            kinds = CommandKind::BLOCK_BEGIN;
        } else if request.is_block_end() {
            kinds = CommandKind::BLOCK_END;
        }
        if self.call.params().is_some() {
            kinds |= CommandKind::VAR_PARAMS;
        }
        match request {
            Request::Surface
            | Request::Atmosphere
            | Request::Interior
            | Request::Exterior
            | Request::Displacement
            | Request::Deformation
            | Request::Imager => kinds |= CommandKind::SHADER,
            Request::LightSource | Request::AreaLightSource => {
                kinds |= CommandKind::SHADER | CommandKind::LIGHT;
            }
            _ => {}
        }
        kinds
    }

    #[must_use]
    pub fn params(&self) -> Option<&ParameterList> {
        self.call.params()
    }

    pub fn params_mut(&mut self) -> Option<&mut ParameterList> {
        self.call.params_mut()
    }

    /// Runs one dispatch phase against `callbacks`.
    pub fn process<C: RenderCallbacks + ?Sized>(
        &self,
        phase: Phase,
        callbacks: &mut C,
        state: &RenderState,
    ) -> Result<()> {
        match phase {
            Phase::Pre => callbacks.pre_command(state, self),
            Phase::Do => callbacks.do_command(state, self),
            Phase::Post => callbacks.post_command(state, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rman_core::{GeometryCounts, ParamValues, Token};
    use rman_core::DeclarationDictionary;
    use smallvec::smallvec;

    #[test]
    fn duplicate_is_deep() {
        let original = RiCommand::new(RiCall::Color {
            color: smallvec![0.1, 0.2, 0.3],
        });
        let mut copy = original.duplicate();
        assert_eq!(copy.duplicate(), original);

        if let RiCall::Color { color } = &mut copy.call {
            color[0] = 0.9;
        }
        let RiCall::Color { color } = &original.call else {
            panic!("variant changed");
        };
        assert_eq!(color[0], 0.1);
    }

    #[test]
    fn duplicate_copies_parameter_lists() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let mut params = ParameterList::new();
        params.set(
            &mut dict,
            &GeometryCounts::CONSTANT,
            3,
            &[Token::new("Kd")],
            &[ParamValues::Floats(&[0.5])],
        );
        let original = RiCommand::new(RiCall::Surface {
            name: Token::new("plastic"),
            params,
        });
        let mut copy = original.duplicate();
        copy.params_mut().unwrap().clear();
        assert_eq!(original.params().unwrap().len(), 1);
    }

    #[test]
    fn kinds() {
        let surface = RiCommand::new(RiCall::Surface {
            name: Token::new("matte"),
            params: ParameterList::new(),
        });
        assert!(surface.is_a(Request::Surface));
        assert!(surface.is_kind_of(CommandKind::ATTRIBUTE | CommandKind::SHADER));
        assert!(surface.is_kind_of(CommandKind::VAR_PARAMS));
        assert!(!surface.is_kind_of(CommandKind::LIGHT));

        let begin = RiCommand::new(RiCall::AttributeBegin {});
        assert!(begin.is_kind_of(CommandKind::BLOCK_BEGIN));
        assert!(!begin.is_kind_of(CommandKind::BLOCK_END));
        assert_eq!(begin.class_name(), "AttributeBegin");
    }
}
