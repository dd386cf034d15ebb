//! Procedural primitives.
//!
//! A procedural produces geometry lazily. Back ends that expand procedurals
//! call [`Procedural::subdivide`] on the calling thread with a
//! [`CommandSink`] that feeds the generated calls into the same renderer;
//! [`Procedural::free`] runs once afterwards.

use std::fmt;
use std::rc::Rc;

use rman_core::{ErrorCode, ParameterList, Result, RiError, Token, tokens};

use crate::calls::RiCall;

/// Receives calls generated while expanding a procedural.
pub trait CommandSink {
    fn emit(&mut self, call: RiCall) -> Result<()>;
}

/// Host-provided geometry generator.
pub trait Subdivider: fmt::Debug {
    /// Name written to RIB in place of the built-in procedural names.
    fn name(&self) -> &str;

    /// Generates the geometry for `args` at the given level of `detail`.
    fn subdivide(&self, args: &[String], detail: f32, sink: &mut dyn CommandSink) -> Result<()>;

    /// Releases whatever `subdivide` needed.
    fn free(&self, _args: &[String]) {}
}

/// Which generator a procedural uses.
#[derive(Debug, Clone)]
pub enum ProceduralKind {
    /// `args[0]` names an archive read when the bound is reached.
    DelayedReadArchive,
    /// `args[0]` is a program writing RIB to its standard output.
    RunProgram,
    /// `args[0]` is a shared library with a subdivision entry point.
    DynamicLoad,
    Host(Rc<dyn Subdivider>),
}

impl PartialEq for ProceduralKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => Rc::ptr_eq(a, b),
            (Self::DelayedReadArchive, Self::DelayedReadArchive)
            | (Self::RunProgram, Self::RunProgram)
            | (Self::DynamicLoad, Self::DynamicLoad) => true,
            _ => false,
        }
    }
}

/// Generator plus its string arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedural {
    pub kind: ProceduralKind,
    pub args: Vec<String>,
}

impl Procedural {
    #[must_use]
    pub fn delayed_read_archive(archive: &str) -> Self {
        Self {
            kind: ProceduralKind::DelayedReadArchive,
            args: vec![archive.to_owned()],
        }
    }

    #[must_use]
    pub fn run_program(program: &str, data: &str) -> Self {
        Self {
            kind: ProceduralKind::RunProgram,
            args: vec![program.to_owned(), data.to_owned()],
        }
    }

    #[must_use]
    pub fn dynamic_load(library: &str, data: &str) -> Self {
        Self {
            kind: ProceduralKind::DynamicLoad,
            args: vec![library.to_owned(), data.to_owned()],
        }
    }

    #[must_use]
    pub fn host(subdivider: Rc<dyn Subdivider>, args: Vec<String>) -> Self {
        Self {
            kind: ProceduralKind::Host(subdivider),
            args,
        }
    }

    /// The name written to RIB.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.kind {
            ProceduralKind::DelayedReadArchive => tokens::DELAYED_READ_ARCHIVE,
            ProceduralKind::RunProgram => tokens::RUN_PROGRAM,
            ProceduralKind::DynamicLoad => tokens::DYNAMIC_LOAD,
            ProceduralKind::Host(s) => s.name(),
        }
    }

    /// Expands the procedural into `sink`.
    pub fn subdivide(&self, detail: f32, sink: &mut dyn CommandSink) -> Result<()> {
        match &self.kind {
            ProceduralKind::DelayedReadArchive => {
                let archive = self.args.first().ok_or_else(|| {
                    RiError::error(
                        ErrorCode::MissingData,
                        "DelayedReadArchive needs an archive name",
                    )
                })?;
                sink.emit(RiCall::ReadArchive {
                    name: Token::new(archive),
                    params: ParameterList::new(),
                })
            }
            ProceduralKind::RunProgram | ProceduralKind::DynamicLoad => Err(RiError::error(
                ErrorCode::Incapable,
                format!("{} output cannot be expanded without a RIB reader", self.name()),
            )),
            ProceduralKind::Host(s) => s.subdivide(&self.args, detail, sink),
        }
    }

    pub fn free(&self) {
        if let ProceduralKind::Host(s) = &self.kind {
            s.free(&self.args);
        }
    }
}
