//! RIB Emission
//!
//! Writes commands as RenderMan Interface Bytestream text.
//!
//! # Overview
//!
//! [`RibWriter`] wraps any [`Write`] sink. Each command becomes one line: the
//! keyword, the positional arguments in interface order and then the
//! parameter list as `"token" [values]` pairs. Block bodies are indented by
//! nesting depth.
//!
//! ```rust,ignore
//! let mut rib = RibWriter::new(Vec::new());
//! rib.write_command(&RiCall::WorldBegin {}.into(), &[])?;
//! ```
//!
//! Values that RIB cannot express are substituted: non-finite floats become
//! `±1e38`, NaN becomes `0`.

use std::io::{self, Write};

use glam::{Mat4, Vec3};

use rman_core::{Basis, LightHandle, ObjectHandle, ParamBuffer, ParameterList, Token, tokens};
use rman_state::{ColorValue, TrimCurve};

use crate::calls::RiCall;
use crate::command::RiCommand;
use crate::procedural::Procedural;

const HEADER: &str = "##RenderMan RIB-Structure 1.1\nversion 3.04\n";
const FLOAT_LIMIT: f32 = 1.0e38;

/// A positional argument that can be written to RIB.
pub trait RibArg {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()>;
}

/// Line oriented RIB writer.
#[derive(Debug)]
pub struct RibWriter<W: Write> {
    out: W,
    depth: usize,
    indent_width: usize,
}

impl<W: Write> RibWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            indent_width: 2,
        }
    }

    /// Spaces per nesting level; `0` disables indentation.
    #[must_use]
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Current block nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Writes the structural header and version line.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.out.write_all(HEADER.as_bytes())
    }

    /// Writes one command, skipping parameters named in `ignore`.
    pub fn write_command(&mut self, cmd: &RiCommand, ignore: &[Token]) -> io::Result<()> {
        if let RiCall::ArchiveRecord { ty, line } = &cmd.call {
            return self.write_record(ty.as_str(), line);
        }
        let request = cmd.request();
        if request.is_block_end() {
            self.depth = self.depth.saturating_sub(1);
        }
        self.write_indent()?;
        self.out.write_all(cmd.class_name().as_bytes())?;
        cmd.call.write_rib_args(self, ignore)?;
        self.out.write_all(b"\n")?;
        if request.is_block_begin() {
            self.depth += 1;
        }
        Ok(())
    }

    /// Writes an archive record: `comment` as `#`, `structure` as `##`,
    /// `verbatim` unchanged.
    pub fn write_record(&mut self, ty: &str, line: &str) -> io::Result<()> {
        match ty {
            tokens::COMMENT => {
                self.write_indent()?;
                writeln!(self.out, "#{line}")
            }
            tokens::STRUCTURE => writeln!(self.out, "##{line}"),
            tokens::VERBATIM => self.out.write_all(line.as_bytes()),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown archive record type \"{other}\""),
            )),
        }
    }

    /// Writes the `"token" [values]` pairs of `params` in binding order.
    pub fn write_params(&mut self, params: &ParameterList, ignore: &[Token]) -> io::Result<()> {
        for param in params {
            if ignore.contains(&param.name()) || ignore.contains(&param.token) {
                continue;
            }
            self.string(param.token.as_str())?;
            match &param.buffer {
                ParamBuffer::Floats(v) => self.floats(v)?,
                ParamBuffer::Ints(v) => self.ints(v)?,
                ParamBuffer::Strings(v) => self.strings(v)?,
            }
        }
        Ok(())
    }

    // ========================================================================
    // Argument primitives; each writes a leading separator.
    // ========================================================================

    pub fn float(&mut self, v: f32) -> io::Result<()> {
        self.out.write_all(b" ")?;
        self.raw_float(v)
    }

    pub fn int(&mut self, v: i32) -> io::Result<()> {
        write!(self.out, " {v}")
    }

    pub fn uint(&mut self, v: u64) -> io::Result<()> {
        write!(self.out, " {v}")
    }

    /// Quoted and escaped string.
    pub fn string(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(b" ")?;
        self.raw_string(s)
    }

    pub fn floats(&mut self, values: &[f32]) -> io::Result<()> {
        self.out.write_all(b" [")?;
        for (i, &v) in values.iter().enumerate() {
            if i > 0 {
                self.out.write_all(b" ")?;
            }
            self.raw_float(v)?;
        }
        self.out.write_all(b"]")
    }

    pub fn ints(&mut self, values: &[i32]) -> io::Result<()> {
        self.out.write_all(b" [")?;
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                self.out.write_all(b" ")?;
            }
            write!(self.out, "{v}")?;
        }
        self.out.write_all(b"]")
    }

    pub fn strings<S: AsRef<str>>(&mut self, values: &[S]) -> io::Result<()> {
        self.out.write_all(b" [")?;
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                self.out.write_all(b" ")?;
            }
            self.raw_string(v.as_ref())?;
        }
        self.out.write_all(b"]")
    }

    fn raw_float(&mut self, v: f32) -> io::Result<()> {
        if v.is_finite() {
            write!(self.out, "{v}")
        } else if v.is_nan() {
            self.out.write_all(b"0")
        } else if v > 0.0 {
            write!(self.out, "{FLOAT_LIMIT:e}")
        } else {
            write!(self.out, "{:e}", -FLOAT_LIMIT)
        }
    }

    fn raw_string(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(b"\"")?;
        for c in s.chars() {
            match c {
                '"' => self.out.write_all(b"\\\"")?,
                '\\' => self.out.write_all(b"\\\\")?,
                '\n' => self.out.write_all(b"\\n")?,
                '\t' => self.out.write_all(b"\\t")?,
                c => write!(self.out, "{c}")?,
            }
        }
        self.out.write_all(b"\"")
    }

    fn write_indent(&mut self) -> io::Result<()> {
        let width = self.depth * self.indent_width;
        if width > 0 {
            write!(self.out, "{:width$}", "")?;
        }
        Ok(())
    }
}

// ============================================================================
// Argument impls
// ============================================================================

impl RibArg for f32 {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.float(*self)
    }
}

impl RibArg for i32 {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.int(*self)
    }
}

impl RibArg for bool {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.int(i32::from(*self))
    }
}

impl RibArg for Token {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.string(self.as_str())
    }
}

impl RibArg for String {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.string(self)
    }
}

impl RibArg for Vec<f32> {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.floats(self)
    }
}

impl RibArg for Vec<i32> {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.ints(self)
    }
}

impl RibArg for Vec<Token> {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        let names: Vec<&str> = self.iter().map(|t| t.as_str()).collect();
        w.strings(&names)
    }
}

impl RibArg for Vec<String> {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.strings(self)
    }
}

impl RibArg for ColorValue {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.floats(self)
    }
}

impl RibArg for [f32; 6] {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.floats(self)
    }
}

impl RibArg for Mat4 {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.floats(&self.to_cols_array())
    }
}

impl RibArg for Vec3 {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.float(self.x)?;
        w.float(self.y)?;
        w.float(self.z)
    }
}

impl RibArg for Basis {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        match Basis::standard_name(&self.matrix) {
            Some(name) => w.string(name)?,
            None => w.floats(&self.matrix.to_cols_array())?,
        }
        w.uint(u64::from(self.step))
    }
}

impl RibArg for TrimCurve {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.ints(&self.ncurves)?;
        w.ints(&self.order)?;
        w.floats(&self.knot)?;
        w.floats(&self.min)?;
        w.floats(&self.max)?;
        w.ints(&self.n)?;
        w.floats(&self.u)?;
        w.floats(&self.v)?;
        w.floats(&self.w)
    }
}

impl RibArg for Procedural {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.string(self.name())?;
        w.strings(&self.args)
    }
}

impl RibArg for LightHandle {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.uint(self.0)
    }
}

impl RibArg for ObjectHandle {
    fn write_rib<W: Write>(&self, w: &mut RibWriter<W>) -> io::Result<()> {
        w.uint(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rman_core::{DeclarationDictionary, GeometryCounts, ParamValues};
    use smallvec::smallvec;

    fn render(calls: Vec<RiCall>) -> String {
        let mut rib = RibWriter::new(Vec::new());
        for call in calls {
            rib.write_command(&RiCommand::new(call), &[]).unwrap();
        }
        String::from_utf8(rib.into_inner()).unwrap()
    }

    fn kd(value: f32) -> ParameterList {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let mut params = ParameterList::new();
        params.set(
            &mut dict,
            &GeometryCounts::CONSTANT,
            3,
            &[Token::new("Kd")],
            &[ParamValues::Floats(&[value])],
        );
        params
    }

    #[test]
    fn nested_blocks_are_indented() {
        let text = render(vec![
            RiCall::WorldBegin {},
            RiCall::AttributeBegin {},
            RiCall::Color {
                color: smallvec![0.5, 0.25, 1.0],
            },
            RiCall::Surface {
                name: Token::new("plastic"),
                params: kd(0.5),
            },
            RiCall::Sphere {
                radius: 1.0,
                zmin: -1.0,
                zmax: 1.0,
                thetamax: 360.0,
                params: ParameterList::new(),
            },
            RiCall::AttributeEnd {},
            RiCall::WorldEnd {},
        ]);
        assert_eq!(
            text,
            "WorldBegin\n\
             \x20 AttributeBegin\n\
             \x20   Color [0.5 0.25 1]\n\
             \x20   Surface \"plastic\" \"Kd\" [0.5]\n\
             \x20   Sphere 1 -1 1 360\n\
             \x20 AttributeEnd\n\
             WorldEnd\n"
        );
    }

    #[test]
    fn ignored_parameters_are_skipped() {
        let mut rib = RibWriter::new(Vec::new());
        let cmd = RiCommand::new(RiCall::Surface {
            name: Token::new("matte"),
            params: kd(1.0),
        });
        rib.write_command(&cmd, &[Token::new("Kd")]).unwrap();
        assert_eq!(String::from_utf8(rib.into_inner()).unwrap(), "Surface \"matte\"\n");
    }

    #[test]
    fn strings_are_escaped_and_floats_clamped() {
        let text = render(vec![
            RiCall::System {
                command: "echo \"hi\"".into(),
            },
            RiCall::MotionBegin {
                times: vec![f32::INFINITY, f32::NEG_INFINITY],
            },
        ]);
        assert_eq!(text, "System \"echo \\\"hi\\\"\"\nMotionBegin [1e38 -1e38]\n");
    }

    #[test]
    fn basis_uses_standard_names() {
        let text = render(vec![RiCall::Basis {
            u_basis: Basis::BEZIER,
            v_basis: Basis::BSPLINE,
        }]);
        assert_eq!(text, "Basis \"bezier\" 3 \"b-spline\" 1\n");
    }

    #[test]
    fn records_and_handles() {
        let text = render(vec![
            RiCall::ArchiveRecord {
                ty: Token::new("structure"),
                line: "Scene test".into(),
            },
            RiCall::ObjectBegin {
                handle: ObjectHandle(3),
            },
            RiCall::ArchiveRecord {
                ty: Token::new("comment"),
                line: " inside".into(),
            },
            RiCall::ObjectEnd {},
            RiCall::ObjectInstance {
                handle: ObjectHandle(3),
            },
        ]);
        assert_eq!(
            text,
            "##Scene test\nObjectBegin 3\n  # inside\nObjectEnd\nObjectInstance 3\n"
        );
    }

    #[test]
    fn procedural_writes_name_args_and_bound() {
        let text = render(vec![RiCall::Procedural {
            procedural: Procedural::delayed_read_archive("tree.rib"),
            bound: [-1.0, 1.0, -1.0, 1.0, 0.0, 2.0],
        }]);
        assert_eq!(
            text,
            "Procedural \"DelayedReadArchive\" [\"tree.rib\"] [-1 1 -1 1 0 2]\n"
        );
    }
}
