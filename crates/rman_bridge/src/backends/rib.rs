//! The `ribwriter` back end.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::rc::Rc;

use log::debug;

use rman_core::{ErrorCode, ParameterList, Result, RiError, Token, tokens};
use rman_scene::{RenderCallbacks, RiCommand, RibWriter};
use rman_state::RenderState;

use crate::base::{Backend, BaseRenderer};
use crate::context::{ContextCreator, RenderContext};

/// Writes every call as ASCII RIB.
pub struct RibBackend<W: Write> {
    writer: RibWriter<W>,
    ignore: Vec<Token>,
}

impl<W: Write> RibBackend<W> {
    #[must_use]
    pub fn new(writer: RibWriter<W>) -> Self {
        Self {
            writer,
            ignore: Vec::new(),
        }
    }

    #[must_use]
    pub fn writer(&self) -> &RibWriter<W> {
        &self.writer
    }

    /// Parameter names left out of every parameter list.
    #[must_use]
    pub fn ignored(&self) -> &[Token] {
        &self.ignore
    }
}

impl<W: Write> RenderCallbacks for RibBackend<W> {
    fn do_command(&mut self, _state: &RenderState, cmd: &RiCommand) -> Result<()> {
        self.writer.write_command(cmd, &self.ignore)?;
        Ok(())
    }
}

impl<W: Write> Backend for RibBackend<W> {
    fn deactivate(&mut self) {
        if let Err(err) = self.writer.flush() {
            debug!("RIB flush on deactivate failed: {err}");
        }
    }

    fn end(&mut self, _state: &RenderState) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// `Control "rib" "ignore" "name1 name2"` sets the ignored parameters.
    fn control(&mut self, name: &str, params: &ParameterList) -> Result<()> {
        if name == "rib" {
            if let Some(ignore) = params.string("ignore") {
                self.ignore = ignore.split_whitespace().map(Token::new).collect();
            }
        }
        Ok(())
    }
}

/// In-memory RIB output shared between the host and a context.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    /// The output so far as text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Creates `ribwriter` contexts.
///
/// Without a buffer, output goes to the file named by the `"file"`
/// parameter of `Begin`, or to standard output.
#[derive(Debug, Clone, Default)]
pub struct RibWriterCreator {
    buffer: Option<SharedBuffer>,
}

impl RibWriterCreator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_buffer(buffer: SharedBuffer) -> Self {
        Self {
            buffer: Some(buffer),
        }
    }
}

impl ContextCreator for RibWriterCreator {
    fn create(&self, params: &ParameterList) -> Result<Box<dyn RenderContext>> {
        let out: Box<dyn Write> = match (&self.buffer, params.string(tokens::FILE)) {
            (Some(buffer), _) => Box::new(buffer.clone()),
            (None, Some(path)) => {
                let file = File::create(path).map_err(|err| {
                    RiError::severe(
                        ErrorCode::System,
                        format!("cannot create RIB file \"{path}\": {err}"),
                    )
                })?;
                debug!("Writing RIB to {path}");
                Box::new(BufWriter::new(file))
            }
            (None, None) => Box::new(io::stdout()),
        };
        let mut writer = RibWriter::new(out);
        writer.write_header()?;
        Ok(Box::new(BaseRenderer::new(RibBackend::new(writer))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rman_core::ParamValues;
    use rman_scene::RiCall;

    fn context(buffer: &SharedBuffer) -> Box<dyn RenderContext> {
        RibWriterCreator::with_buffer(buffer.clone())
            .create(&ParameterList::new())
            .unwrap()
    }

    #[test]
    fn writes_header_and_indented_blocks() {
        let buffer = SharedBuffer::new();
        let mut ctx = context(&buffer);
        ctx.request(RiCall::WorldBegin {}, &[], &[]).unwrap();
        ctx.request(
            RiCall::Surface {
                name: Token::new("plastic"),
                params: ParameterList::new(),
            },
            &[Token::new("Kd")],
            &[ParamValues::Floats(&[0.5])],
        )
        .unwrap();
        ctx.request(RiCall::WorldEnd {}, &[], &[]).unwrap();
        ctx.end().unwrap();

        assert_eq!(
            buffer.text(),
            "##RenderMan RIB-Structure 1.1\nversion 3.04\n\
             WorldBegin\n  Surface \"plastic\" \"Kd\" [0.5]\nWorldEnd\n"
        );
    }

    #[test]
    fn ignored_parameters_are_dropped() {
        let buffer = SharedBuffer::new();
        let mut ctx = context(&buffer);
        let mut control = ParameterList::new();
        let mut dict = rman_core::DeclarationDictionary::new();
        dict.declare("ignore", "string", true).unwrap();
        control.set(
            &mut dict,
            &rman_core::GeometryCounts::CONSTANT,
            3,
            &[Token::new("ignore")],
            &[ParamValues::Strings(&["Kd"])],
        );
        ctx.control("rib", &control).unwrap();
        buffer.clear();

        ctx.request(
            RiCall::Surface {
                name: Token::new("matte"),
                params: ParameterList::new(),
            },
            &[Token::new("Kd"), Token::new("Ka")],
            &[ParamValues::Floats(&[0.5]), ParamValues::Floats(&[1.0])],
        )
        .unwrap();
        assert_eq!(buffer.text(), "Surface \"matte\" \"Ka\" [1]\n");
    }
}
