//! Parser for the script source format.
//!
//! A script is a sequence of blocks. Each block carries an optional preamble
//! of bracketed sections, an optional pass declaration, and a raw body
//! delimited by `{{` / `}}`. Bodies are captured verbatim together with the
//! 1-based line their text starts on; everything else is tokenized with
//! whitespace and `//` / `/* */` comments insignificant between tokens.

use crate::error::Error;
use crate::types::{
    BlendMode, ImageAccess, ImageType, PixelFormat, PodAccess, PodType, SamplerType,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub preamble: Vec<PreambleSection>,
    pub decl: Option<PassDecl>,
    pub body: BlockBody,
}

/// Raw body text plus the 1-based source line it starts on (the line of the
/// opening `{{`).
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBody {
    pub text: String,
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreambleSection {
    Rendergraph,
    BlendMode(BlendMode),
    Declaration { name: String },
    Include { names: Vec<String> },
    Numthreads { x: i32, y: i32, z: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDecl {
    pub return_type: PodType,
    pub name: String,
    pub arg_descs: Vec<ArgDesc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgDesc {
    pub kind: ArgKind,
    pub name: String,
}

/// Closed set of argument categories. The two marshaling sites (shader
/// declaration building and invocation argument conversion) match on this
/// exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    Pod {
        ty: PodType,
        access: Option<PodAccess>,
    },
    Image {
        ty: ImageType,
        format: PixelFormat,
        access: Option<ImageAccess>,
    },
    Sampler(SamplerType),
}

pub fn parse(source: &str) -> Result<ParsedScript, Error> {
    let mut cursor = Cursor::new(source);
    let mut blocks = Vec::new();
    loop {
        cursor.skip_trivia()?;
        if cursor.at_end() {
            break;
        }
        blocks.push(parse_block(&mut cursor)?);
    }
    Ok(ParsedScript { blocks })
}

fn parse_block(cursor: &mut Cursor<'_>) -> Result<Block, Error> {
    let mut preamble = Vec::new();
    loop {
        cursor.skip_trivia()?;
        if cursor.peek() == Some('[') {
            preamble.push(parse_preamble_section(cursor)?);
        } else {
            break;
        }
    }

    cursor.skip_trivia()?;
    let decl = if cursor.starts_with("{{") {
        None
    } else {
        Some(parse_pass_decl(cursor)?)
    };

    cursor.skip_trivia()?;
    let (open_line, open_column) = cursor.position();
    if !cursor.eat("{{") {
        return Err(cursor.error("expected '{{' to open a block body"));
    }
    let body = capture_body(cursor, open_line, open_column)?;
    Ok(Block { preamble, decl, body })
}

fn capture_body(
    cursor: &mut Cursor<'_>,
    open_line: usize,
    open_column: usize,
) -> Result<BlockBody, Error> {
    let start = cursor.offset();
    let start_line = cursor.line();
    loop {
        if cursor.at_end() {
            return Err(Error::Syntax {
                line: open_line,
                column: open_column,
                message: "unterminated block: missing closing '}}'".to_string(),
            });
        }
        if cursor.starts_with("}}") {
            break;
        }
        cursor.bump();
    }
    let text = cursor.slice_from(start).to_string();
    cursor.eat("}}");
    Ok(BlockBody {
        text,
        start: start_line,
    })
}

fn parse_preamble_section(cursor: &mut Cursor<'_>) -> Result<PreambleSection, Error> {
    cursor.eat("[");
    cursor.skip_trivia()?;
    let (keyword_line, keyword_column) = cursor.position();
    let keyword = cursor.identifier()?;

    let section = match keyword.as_str() {
        "rendergraph" => PreambleSection::Rendergraph,
        "blendmode" => {
            expect_punct(cursor, ":")?;
            cursor.skip_trivia()?;
            let (line, column) = cursor.position();
            let mode = cursor.identifier()?;
            let Some(mode) = BlendMode::from_keyword(&mode) else {
                return Err(Error::Syntax {
                    line,
                    column,
                    message: format!("unknown blend mode '{mode}'"),
                });
            };
            PreambleSection::BlendMode(mode)
        }
        "declaration" => {
            expect_punct(cursor, ":")?;
            cursor.skip_trivia()?;
            let name = cursor.quoted_string()?;
            PreambleSection::Declaration { name }
        }
        "include" => {
            expect_punct(cursor, ":")?;
            let mut names = Vec::new();
            loop {
                cursor.skip_trivia()?;
                names.push(cursor.quoted_string()?);
                cursor.skip_trivia()?;
                if !cursor.eat(",") {
                    break;
                }
            }
            PreambleSection::Include { names }
        }
        "numthreads" => {
            expect_punct(cursor, "(")?;
            cursor.skip_trivia()?;
            let x = cursor.integer()?;
            expect_punct(cursor, ",")?;
            cursor.skip_trivia()?;
            let y = cursor.integer()?;
            expect_punct(cursor, ",")?;
            cursor.skip_trivia()?;
            let z = cursor.integer()?;
            expect_punct(cursor, ")")?;
            PreambleSection::Numthreads { x, y, z }
        }
        other => {
            return Err(Error::Syntax {
                line: keyword_line,
                column: keyword_column,
                message: format!("unknown preamble section '{other}'"),
            });
        }
    };

    cursor.skip_trivia()?;
    if !cursor.eat("]") {
        return Err(cursor.error("expected ']' to close the preamble section"));
    }
    Ok(section)
}

fn parse_pass_decl(cursor: &mut Cursor<'_>) -> Result<PassDecl, Error> {
    cursor.skip_trivia()?;
    if !cursor.at_identifier_start() {
        return Err(cursor.error("expected a pass declaration or a '{{' block body"));
    }
    let (line, column) = cursor.position();
    let keyword = cursor.identifier()?;
    let Some(return_type) = PodType::from_keyword(&keyword) else {
        return Err(Error::Syntax {
            line,
            column,
            message: format!("expected a return type, found '{keyword}'"),
        });
    };

    cursor.skip_trivia()?;
    let name = cursor.identifier()?;
    cursor.skip_trivia()?;
    expect_punct(cursor, "(")?;

    let mut arg_descs = Vec::new();
    cursor.skip_trivia()?;
    if !cursor.starts_with(")") {
        loop {
            arg_descs.push(parse_arg_desc(cursor)?);
            cursor.skip_trivia()?;
            if !cursor.eat(",") {
                break;
            }
        }
    }
    expect_punct(cursor, ")")?;

    Ok(PassDecl {
        return_type,
        name,
        arg_descs,
    })
}

fn parse_arg_desc(cursor: &mut Cursor<'_>) -> Result<ArgDesc, Error> {
    cursor.skip_trivia()?;
    let (line, column) = cursor.position();
    let keyword = cursor.identifier()?;

    let kind = if let Some(access) = PodAccess::from_keyword(&keyword) {
        cursor.skip_trivia()?;
        let (ty_line, ty_column) = cursor.position();
        let ty_keyword = cursor.identifier()?;
        let Some(ty) = PodType::from_keyword(&ty_keyword) else {
            return Err(Error::Syntax {
                line: ty_line,
                column: ty_column,
                message: format!("expected a pod type after the access qualifier, found '{ty_keyword}'"),
            });
        };
        ArgKind::Pod {
            ty,
            access: Some(access),
        }
    } else if let Some(ty) = PodType::from_keyword(&keyword) {
        ArgKind::Pod { ty, access: None }
    } else if let Some(access) = ImageAccess::from_keyword(&keyword) {
        cursor.skip_trivia()?;
        let (ty_line, ty_column) = cursor.position();
        let ty_keyword = cursor.identifier()?;
        let Some(ty) = ImageType::from_keyword(&ty_keyword) else {
            return Err(Error::Syntax {
                line: ty_line,
                column: ty_column,
                message: format!("expected an image type after the access qualifier, found '{ty_keyword}'"),
            });
        };
        parse_image_format(cursor, ty, Some(access))?
    } else if let Some(ty) = ImageType::from_keyword(&keyword) {
        parse_image_format(cursor, ty, None)?
    } else if let Some(ty) = SamplerType::from_keyword(&keyword) {
        ArgKind::Sampler(ty)
    } else {
        return Err(Error::Syntax {
            line,
            column,
            message: format!("unknown argument type '{keyword}'"),
        });
    };

    cursor.skip_trivia()?;
    let name = cursor.identifier()?;
    Ok(ArgDesc { kind, name })
}

fn parse_image_format(
    cursor: &mut Cursor<'_>,
    ty: ImageType,
    access: Option<ImageAccess>,
) -> Result<ArgKind, Error> {
    expect_punct(cursor, "<")?;
    cursor.skip_trivia()?;
    let (line, column) = cursor.position();
    let keyword = cursor.identifier()?;
    let Some(format) = PixelFormat::from_keyword(&keyword) else {
        return Err(Error::Syntax {
            line,
            column,
            message: format!("unknown pixel format '{keyword}'"),
        });
    };
    expect_punct(cursor, ">")?;
    Ok(ArgKind::Image { ty, format, access })
}

fn expect_punct(cursor: &mut Cursor<'_>, punct: &str) -> Result<(), Error> {
    cursor.skip_trivia()?;
    if cursor.eat(punct) {
        Ok(())
    } else {
        Err(cursor.error(format!("expected '{punct}'")))
    }
}

/// Character cursor tracking 1-based line/column positions.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn line(&self) -> usize {
        self.line
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn slice_from(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            // A bare '\r' (not followed by '\n') also terminates a line.
            '\r' if self.peek() != Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn eat(&mut self, s: &str) -> bool {
        if !self.starts_with(s) {
            return false;
        }
        for _ in s.chars() {
            self.bump();
        }
        true
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), Error> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.bump();
                }
                Some('/') if self.starts_with("//") => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.starts_with("/*") => {
                    let (line, column) = self.position();
                    self.eat("/*");
                    loop {
                        if self.at_end() {
                            return Err(Error::Syntax {
                                line,
                                column,
                                message: "unterminated block comment".to_string(),
                            });
                        }
                        if self.eat("*/") {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn at_identifier_start(&self) -> bool {
        matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_')
    }

    fn identifier(&mut self) -> Result<String, Error> {
        if !self.at_identifier_start() {
            return Err(self.error("expected an identifier"));
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.slice_from(start).to_string())
    }

    fn quoted_string(&mut self) -> Result<String, Error> {
        let (line, column) = self.position();
        if !self.eat("\"") {
            return Err(self.error("expected a quoted string"));
        }
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(Error::Syntax {
                        line,
                        column,
                        message: "unterminated string".to_string(),
                    });
                }
                Some('"') => break,
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = self.slice_from(start).to_string();
        self.eat("\"");
        Ok(text)
    }

    fn integer(&mut self) -> Result<i32, Error> {
        let (line, column) = self.position();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let digits = self.slice_from(start);
        if digits.is_empty() {
            return Err(self.error("expected an integer"));
        }
        digits.parse().map_err(|_| Error::Syntax {
            line,
            column,
            message: format!("integer literal '{digits}' is out of range"),
        })
    }
}
