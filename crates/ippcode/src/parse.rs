//! XML loader for IPPcode22 source.
//!
//! Walks the document with `quick-xml` events and produces a validated
//! [`Program`]. All structural validation happens here: element and
//! attribute shape, opcode lookup, arity and operand kinds, literal syntax,
//! and `\DDD` escape decoding. The engine never sees raw source text.
//!
//! Failure split: a document the XML parser itself rejects is *malformed*
//! (code 31); a well-formed document with the wrong shape is a *structure*
//! error (code 32).

use std::{io::BufRead, str::FromStr};

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use smallvec::SmallVec;

use crate::{
    error::{InterpretError, RunResult},
    frame::{FrameKind, VarRef},
    opcode::{Opcode, OperandKind},
    program::{Arg, Instruction, Program},
    value::{DataType, Value},
};

/// Parses one IPPcode22 source document into a [`Program`].
pub fn parse_program<R: BufRead>(source: R) -> RunResult<Program> {
    Loader::new(source).load()
}

/// Raw `argN` element content before operand-kind validation.
#[derive(Debug)]
struct RawArg {
    type_attr: String,
    text: String,
}

struct Loader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> Loader<R> {
    fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
        }
    }

    /// Reads the next event, owned so the buffer can be reused immediately.
    fn next(&mut self) -> RunResult<Event<'static>> {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok(event.into_owned()),
            Err(err) => Err(InterpretError::malformed_xml(format!("invalid XML: {err}"))),
        }
    }

    fn load(&mut self) -> RunResult<Program> {
        let mut instructions = Vec::new();

        // Prolog: skip the declaration, comments and whitespace up to the
        // root element. The root's name is not significant.
        let root_is_empty = loop {
            match self.next()? {
                Event::Start(_) => break false,
                Event::Empty(_) => break true,
                Event::Text(text) => {
                    if !text.unescape().is_ok_and(|t| t.trim().is_empty()) {
                        return Err(InterpretError::malformed_xml("text before the root element"));
                    }
                }
                Event::Eof => {
                    return Err(InterpretError::malformed_xml("missing root element"));
                }
                _ => {}
            }
        };

        if !root_is_empty {
            loop {
                match self.next()? {
                    Event::Start(start) => {
                        if start.name().as_ref() != b"instruction" {
                            return Err(unexpected_element(&start));
                        }
                        let (opcode, order) = instruction_head(&start)?;
                        let raw_args = self.read_arg_elements(opcode)?;
                        instructions.push(build_instruction(opcode, order, raw_args)?);
                    }
                    Event::Empty(start) => {
                        if start.name().as_ref() != b"instruction" {
                            return Err(unexpected_element(&start));
                        }
                        let (opcode, order) = instruction_head(&start)?;
                        instructions.push(build_instruction(opcode, order, [None, None, None])?);
                    }
                    Event::Text(text) => {
                        let text = text
                            .unescape()
                            .map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")))?;
                        if !text.trim().is_empty() {
                            return Err(InterpretError::structure(
                                "unexpected text content in the program element",
                            ));
                        }
                    }
                    Event::CData(_) => {
                        return Err(InterpretError::structure(
                            "unexpected text content in the program element",
                        ));
                    }
                    Event::End(_) => break,
                    Event::Eof => {
                        return Err(InterpretError::malformed_xml("unclosed root element"));
                    }
                    _ => {}
                }
            }
        }

        // Nothing but whitespace and comments may follow the root.
        loop {
            match self.next()? {
                Event::Eof => break,
                Event::Text(text) => {
                    if !text.unescape().is_ok_and(|t| t.trim().is_empty()) {
                        return Err(InterpretError::malformed_xml("content after the root element"));
                    }
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) => {}
                _ => {
                    return Err(InterpretError::malformed_xml("content after the root element"));
                }
            }
        }

        Program::from_instructions(instructions)
    }

    /// Reads the `arg1`..`arg3` children of one `instruction` element,
    /// slotting them by tag name. Document order of the children does not
    /// matter; duplicates do.
    fn read_arg_elements(&mut self, opcode: Opcode) -> RunResult<[Option<RawArg>; 3]> {
        let mut slots: [Option<RawArg>; 3] = [None, None, None];
        loop {
            match self.next()? {
                Event::Start(start) => {
                    let index = arg_index(&start, opcode)?;
                    let type_attr = arg_type_attr(&start)?;
                    let text = self.read_arg_text()?;
                    fill_arg_slot(&mut slots, index, RawArg { type_attr, text }, opcode)?;
                }
                Event::Empty(start) => {
                    let index = arg_index(&start, opcode)?;
                    let type_attr = arg_type_attr(&start)?;
                    let raw = RawArg {
                        type_attr,
                        text: String::new(),
                    };
                    fill_arg_slot(&mut slots, index, raw, opcode)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")))?;
                    if !text.trim().is_empty() {
                        return Err(InterpretError::structure(format!(
                            "unexpected text content in instruction {opcode}"
                        )));
                    }
                }
                Event::CData(_) => {
                    return Err(InterpretError::structure(format!(
                        "unexpected text content in instruction {opcode}"
                    )));
                }
                Event::End(_) => return Ok(slots),
                Event::Eof => {
                    return Err(InterpretError::malformed_xml("unclosed instruction element"));
                }
                _ => {}
            }
        }
    }

    /// Collects the text content of one `argN` element up to its end tag.
    /// Nested elements are rejected; text and CDATA runs are concatenated.
    fn read_arg_text(&mut self) -> RunResult<String> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(run) => {
                    let run = run
                        .unescape()
                        .map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")))?;
                    text.push_str(&run);
                }
                Event::CData(run) => {
                    let run = String::from_utf8(run.into_inner().into_owned())
                        .map_err(|_| InterpretError::malformed_xml("argument text is not valid UTF-8"))?;
                    text.push_str(&run);
                }
                Event::Start(_) | Event::Empty(_) => {
                    return Err(InterpretError::structure(
                        "argument elements must not contain child elements",
                    ));
                }
                Event::End(_) => return Ok(text),
                Event::Eof => {
                    return Err(InterpretError::malformed_xml("unclosed argument element"));
                }
                _ => {}
            }
        }
    }
}

fn unexpected_element(start: &BytesStart<'_>) -> InterpretError {
    InterpretError::structure(format!(
        "unexpected element <{}> in the program element",
        String::from_utf8_lossy(start.name().as_ref())
    ))
}

/// Extracts and validates the `opcode` and `order` attributes.
fn instruction_head(start: &BytesStart<'_>) -> RunResult<(Opcode, i32)> {
    let mut opcode_text = None;
    let mut order_text = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")))?;
        let value = attr
            .unescape_value()
            .map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")))?;
        match attr.key.as_ref() {
            b"opcode" => opcode_text = Some(value.into_owned()),
            b"order" => order_text = Some(value.into_owned()),
            _ => {}
        }
    }

    let opcode_text = opcode_text
        .ok_or_else(|| InterpretError::structure("instruction element is missing the opcode attribute"))?;
    let order_text = order_text
        .ok_or_else(|| InterpretError::structure("instruction element is missing the order attribute"))?;

    // Opcodes are case-insensitive in source.
    let opcode = Opcode::from_str(&opcode_text.to_ascii_uppercase())
        .map_err(|_| InterpretError::structure(format!("invalid opcode {opcode_text}")))?;

    let order = order_text
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|order| *order >= 1)
        .ok_or_else(|| InterpretError::structure(format!("invalid instruction order {order_text}")))?;

    Ok((opcode, order))
}

/// Maps an `argN` tag name to its zero-based operand index.
fn arg_index(start: &BytesStart<'_>, opcode: Opcode) -> RunResult<usize> {
    match start.name().as_ref() {
        b"arg1" => Ok(0),
        b"arg2" => Ok(1),
        b"arg3" => Ok(2),
        name => Err(InterpretError::structure(format!(
            "unexpected element <{}> in instruction {opcode}",
            String::from_utf8_lossy(name)
        ))),
    }
}

/// Extracts the mandatory `type` attribute of an `argN` element.
fn arg_type_attr(start: &BytesStart<'_>) -> RunResult<String> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")))?;
        if attr.key.as_ref() == b"type" {
            return attr
                .unescape_value()
                .map(|value| value.into_owned())
                .map_err(|err| InterpretError::malformed_xml(format!("invalid XML: {err}")));
        }
    }
    Err(InterpretError::structure(
        "argument element is missing the type attribute",
    ))
}

fn fill_arg_slot(
    slots: &mut [Option<RawArg>; 3],
    index: usize,
    raw: RawArg,
    opcode: Opcode,
) -> RunResult<()> {
    if slots[index].is_some() {
        return Err(InterpretError::structure(format!(
            "duplicate arg{} in instruction {opcode}",
            index + 1
        )));
    }
    slots[index] = Some(raw);
    Ok(())
}

/// Checks arity and operand kinds against the opcode signature and builds
/// the decoded instruction.
fn build_instruction(
    opcode: Opcode,
    order: i32,
    raw_args: [Option<RawArg>; 3],
) -> RunResult<Instruction> {
    let signature = opcode.signature();
    let mut args: SmallVec<[Arg; 3]> = SmallVec::new();
    for (index, slot) in raw_args.into_iter().enumerate() {
        match (signature.get(index), slot) {
            (Some(kind), Some(raw)) => args.push(build_arg(*kind, &raw, opcode)?),
            (None, None) => {}
            (Some(_), None) | (None, Some(_)) => {
                return Err(InterpretError::structure(format!(
                    "instruction {opcode} takes {} argument(s)",
                    signature.len()
                )));
            }
        }
    }
    Ok(Instruction { opcode, order, args })
}

/// Validates one raw argument against the operand kind its position
/// requires and decodes it.
fn build_arg(kind: OperandKind, raw: &RawArg, opcode: Opcode) -> RunResult<Arg> {
    match kind {
        OperandKind::Var => match raw.type_attr.as_str() {
            "var" => Ok(Arg::Var(parse_var_ref(raw.text.trim())?)),
            other => Err(type_tag_error(opcode, other, "var")),
        },
        OperandKind::Label => match raw.type_attr.as_str() {
            "label" => {
                let name = raw.text.trim();
                if name.is_empty() {
                    return Err(InterpretError::structure(format!(
                        "empty label name in instruction {opcode}"
                    )));
                }
                Ok(Arg::Label(name.to_owned()))
            }
            other => Err(type_tag_error(opcode, other, "label")),
        },
        OperandKind::Type => match raw.type_attr.as_str() {
            "type" => {
                let name = raw.text.trim();
                match DataType::from_str(name) {
                    Ok(DataType::Nil) | Err(_) => Err(InterpretError::structure(format!(
                        "invalid type name {name} in instruction {opcode}"
                    ))),
                    Ok(data_type) => Ok(Arg::Type(data_type)),
                }
            }
            other => Err(type_tag_error(opcode, other, "type")),
        },
        OperandKind::Symb => match raw.type_attr.as_str() {
            "var" => Ok(Arg::Var(parse_var_ref(raw.text.trim())?)),
            "int" => {
                let text = raw.text.trim();
                let value = text.parse::<i64>().map_err(|_| {
                    InterpretError::structure(format!("invalid int literal {text}"))
                })?;
                Ok(Arg::Literal(Value::Int(value)))
            }
            "bool" => match raw.text.trim() {
                "true" => Ok(Arg::Literal(Value::Bool(true))),
                "false" => Ok(Arg::Literal(Value::Bool(false))),
                text => Err(InterpretError::structure(format!(
                    "invalid bool literal {text}"
                ))),
            },
            "string" => Ok(Arg::Literal(Value::Str(decode_escapes(&raw.text)?))),
            "nil" => match raw.text.trim() {
                "nil" => Ok(Arg::Literal(Value::Nil)),
                text => Err(InterpretError::structure(format!(
                    "invalid nil literal {text}"
                ))),
            },
            other => Err(InterpretError::structure(format!(
                "invalid operand type {other} in instruction {opcode}"
            ))),
        },
    }
}

fn type_tag_error(opcode: Opcode, got: &str, expected: &str) -> InterpretError {
    InterpretError::structure(format!(
        "instruction {opcode} expects a {expected} operand, got type {got}"
    ))
}

/// Parses a `GF@name` / `LF@name` / `TF@name` variable reference.
fn parse_var_ref(text: &str) -> RunResult<VarRef> {
    let Some((prefix, name)) = text.split_once('@') else {
        return Err(InterpretError::structure(format!(
            "invalid variable reference {text}"
        )));
    };
    let Some(frame) = FrameKind::from_prefix(prefix) else {
        return Err(InterpretError::structure(format!(
            "invalid frame prefix in variable reference {text}"
        )));
    };
    if name.is_empty() {
        return Err(InterpretError::structure(format!(
            "missing variable name in reference {text}"
        )));
    }
    Ok(VarRef {
        frame,
        name: name.to_owned(),
    })
}

/// Decodes `\DDD` escape triples (exactly three decimal digits) to the code
/// point with that value. A backslash not followed by three digits is kept
/// verbatim.
fn decode_escapes(raw: &str) -> RunResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let rest = chars.as_str().as_bytes();
        if rest.len() >= 3 && rest[..3].iter().all(u8::is_ascii_digit) {
            let code = u32::from(rest[0] - b'0') * 100
                + u32::from(rest[1] - b'0') * 10
                + u32::from(rest[2] - b'0');
            let decoded = char::from_u32(code).ok_or_else(|| {
                InterpretError::structure(format!("invalid escape code {code}"))
            })?;
            out.push(decoded);
            // consume the three digit characters
            chars.nth(2);
        } else {
            out.push('\\');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn parse(source: &str) -> RunResult<Program> {
        parse_program(source.as_bytes())
    }

    #[test]
    fn decodes_escape_triples() {
        assert_eq!(decode_escapes(r"ab\092c").unwrap(), "ab\\c");
        assert_eq!(decode_escapes(r"\032\035\032").unwrap(), " # ");
        assert_eq!(decode_escapes(r"\010").unwrap(), "\n");
        // not an escape: too few digits
        assert_eq!(decode_escapes(r"a\01").unwrap(), "a\\01");
        // a decoded backslash does not start a new escape
        assert_eq!(decode_escapes(r"\092092").unwrap(), "\\092");
    }

    #[test]
    fn parses_a_minimal_program() {
        let program = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <program language="IPPcode22">
              <instruction order="2" opcode="WRITE">
                <arg1 type="string">hi</arg1>
              </instruction>
              <instruction order="1" opcode="defvar">
                <arg1 type="var">GF@x</arg1>
              </instruction>
            </program>"#,
        )
        .unwrap();

        assert_eq!(program.len(), 2);
        // sorted by order, case-insensitive opcode
        assert_eq!(program.get(0).opcode, Opcode::DefVar);
        assert_eq!(program.get(1).opcode, Opcode::Write);
        assert_eq!(
            program.get(1).arg(0),
            &Arg::Literal(Value::Str("hi".to_owned()))
        );
    }

    #[test]
    fn args_may_come_in_any_document_order() {
        let program = parse(
            r#"<program>
              <instruction order="1" opcode="MOVE">
                <arg2 type="int">42</arg2>
                <arg1 type="var">GF@x</arg1>
              </instruction>
            </program>"#,
        )
        .unwrap();
        assert_eq!(program.get(0).arg(1), &Arg::Literal(Value::Int(42)));
    }

    #[test]
    fn malformed_xml_is_code_31() {
        let err = parse("<program><instruction order=").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlMalformed);
        let err = parse("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlMalformed);
    }

    #[test]
    fn structural_failures_are_code_32() {
        // wrong child element
        let err = parse("<program><foo/></program>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
        // unknown opcode
        let err = parse(r#"<program><instruction order="1" opcode="NOP"/></program>"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
        // bad order
        let err = parse(r#"<program><instruction order="0" opcode="BREAK"/></program>"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
        // wrong arity
        let err = parse(
            r#"<program><instruction order="1" opcode="BREAK">
                <arg1 type="int">1</arg1>
            </instruction></program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
        // bad type tag
        let err = parse(
            r#"<program><instruction order="1" opcode="DEFVAR">
                <arg1 type="int">1</arg1>
            </instruction></program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
        // bad bool literal (only exact lowercase forms are literals)
        let err = parse(
            r#"<program><instruction order="1" opcode="PUSHS">
                <arg1 type="bool">True</arg1>
            </instruction></program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
        // duplicate order
        let err = parse(
            r#"<program>
                <instruction order="1" opcode="BREAK"/>
                <instruction order="1" opcode="BREAK"/>
            </program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
    }

    #[test]
    fn duplicate_label_is_code_52() {
        let err = parse(
            r#"<program>
                <instruction order="1" opcode="LABEL"><arg1 type="label">l</arg1></instruction>
                <instruction order="2" opcode="LABEL"><arg1 type="label">l</arg1></instruction>
            </program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }

    #[test]
    fn string_text_is_verbatim_and_may_be_absent() {
        let program = parse(
            r#"<program>
              <instruction order="1" opcode="PUSHS"><arg1 type="string"> a b </arg1></instruction>
              <instruction order="2" opcode="PUSHS"><arg1 type="string"/></instruction>
              <instruction order="3" opcode="PUSHS"><arg1 type="string">a&lt;&amp;&gt;b</arg1></instruction>
            </program>"#,
        )
        .unwrap();
        assert_eq!(
            program.get(0).arg(0),
            &Arg::Literal(Value::Str(" a b ".to_owned()))
        );
        assert_eq!(program.get(1).arg(0), &Arg::Literal(Value::Str(String::new())));
        assert_eq!(
            program.get(2).arg(0),
            &Arg::Literal(Value::Str("a<&>b".to_owned()))
        );
    }

    #[test]
    fn int_literals_are_trimmed_and_validated() {
        let program = parse(
            r#"<program>
              <instruction order="1" opcode="PUSHS"><arg1 type="int"> -7 </arg1></instruction>
            </program>"#,
        )
        .unwrap();
        assert_eq!(program.get(0).arg(0), &Arg::Literal(Value::Int(-7)));

        let err = parse(
            r#"<program>
              <instruction order="1" opcode="PUSHS"><arg1 type="int">42abc</arg1></instruction>
            </program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
    }

    #[test]
    fn var_references_are_validated() {
        let err = parse(
            r#"<program>
              <instruction order="1" opcode="DEFVAR"><arg1 type="var">XX@x</arg1></instruction>
            </program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);

        let err = parse(
            r#"<program>
              <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@</arg1></instruction>
            </program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
    }

    #[test]
    fn read_type_operand_rejects_nil() {
        let err = parse(
            r#"<program>
              <instruction order="1" opcode="READ">
                <arg1 type="var">GF@x</arg1>
                <arg2 type="type">nil</arg2>
              </instruction>
            </program>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
    }
}
