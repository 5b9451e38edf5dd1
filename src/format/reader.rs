//! Cursor over scene text

use cgmath::Vector3;

use crate::error::SceneError;
use crate::gfx::scene::Transform;
use crate::ui::frame::{Length, Unit};
use crate::ui::theme::Color;

/// Characters that end a free-text field
pub const FIELD_DELIMITERS: &[char] = &[',', '(', ')', '[', ']', '{', '}', '|'];
/// Makes the following character part of a free-text field
pub const FIELD_ESCAPE: char = '\\';

pub struct SceneReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> SceneReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset of the next unread character
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn next_char(&mut self) -> Result<char, SceneError> {
        let c = self.peek().ok_or(SceneError::UnexpectedEof { offset: self.pos })?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Consumes `c` when it is next
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: char) -> Result<(), SceneError> {
        let offset = self.pos;
        let found = self.next_char()?;
        if found == expected {
            Ok(())
        } else {
            Err(SceneError::Expected {
                expected,
                found,
                offset,
            })
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    /// Node keyword: a run of ASCII letters
    pub fn keyword(&mut self) -> Result<&'a str, SceneError> {
        if self.is_eof() {
            return Err(SceneError::UnexpectedEof { offset: self.pos });
        }
        let offset = self.pos;
        let word = self.take_while(|c| c.is_ascii_alphabetic());
        if word.is_empty() {
            let found = self.peek().unwrap_or(' ');
            return Err(SceneError::Expected {
                expected: 'a',
                found,
                offset,
            });
        }
        Ok(word)
    }

    /// Script name: letters, digits and underscores
    pub fn identifier(&mut self) -> &'a str {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Free text up to the next unescaped delimiter
    pub fn field(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if FIELD_DELIMITERS.contains(&c) {
                break;
            }
            self.pos += c.len_utf8();
            if c == FIELD_ESCAPE {
                if let Some(escaped) = self.peek() {
                    self.pos += escaped.len_utf8();
                    text.push(escaped);
                    continue;
                }
            }
            text.push(c);
        }
        text
    }

    pub fn number(&mut self) -> Result<f32, SceneError> {
        let offset = self.pos;
        let text = self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        if text.is_empty() && self.is_eof() {
            return Err(SceneError::UnexpectedEof { offset });
        }
        text.parse().map_err(|_| SceneError::InvalidNumber {
            text: text.to_owned(),
            offset,
        })
    }

    pub fn integer(&mut self) -> Result<i64, SceneError> {
        let offset = self.pos;
        let text = self.take_while(|c| c.is_ascii_digit() || c == '-' || c == '+');
        if text.is_empty() && self.is_eof() {
            return Err(SceneError::UnexpectedEof { offset });
        }
        text.parse().map_err(|_| SceneError::InvalidNumber {
            text: text.to_owned(),
            offset,
        })
    }

    /// An integer that must fit `T`, such as a count or a font size
    pub fn unsigned<T: TryFrom<i64>>(&mut self) -> Result<T, SceneError> {
        let offset = self.pos;
        let value = self.integer()?;
        T::try_from(value).map_err(|_| SceneError::InvalidNumber {
            text: value.to_string(),
            offset,
        })
    }

    /// A number immediately followed by its unit character
    pub fn length(&mut self) -> Result<Length, SceneError> {
        let value = self.number()?;
        let offset = self.pos;
        let found = self.next_char()?;
        let unit = Unit::from_char(found).ok_or(SceneError::InvalidUnit { found, offset })?;
        Ok(Length::new(value, unit))
    }

    /// `#RRGGBBAA`
    pub fn color(&mut self) -> Result<Color, SceneError> {
        self.expect('#')?;
        let offset = self.pos;
        let digits = self.take_while(|c| c.is_ascii_hexdigit());
        Color::from_hex(digits).ok_or_else(|| SceneError::InvalidColor {
            text: digits.to_owned(),
            offset,
        })
    }

    fn vector(&mut self) -> Result<Vector3<f32>, SceneError> {
        let x = self.number()?;
        self.expect(',')?;
        let y = self.number()?;
        self.expect(',')?;
        let z = self.number()?;
        Ok(Vector3::new(x, y, z))
    }

    /// `{px,py,pz;rx,ry,rz;sx,sy,sz}`
    pub fn transform(&mut self) -> Result<Transform, SceneError> {
        self.expect('{')?;
        let position = self.vector()?;
        self.expect(';')?;
        let rotation = self.vector()?;
        self.expect(';')?;
        let scale = self.vector()?;
        self.expect('}')?;
        Ok(Transform {
            position,
            rotation,
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_and_units() {
        let mut reader = SceneReader::new("12.5p,-3%,40w,7hx");
        assert_eq!(reader.length().unwrap(), Length::new(12.5, Unit::Pixel));
        reader.expect(',').unwrap();
        assert_eq!(reader.length().unwrap(), Length::new(-3.0, Unit::Percent));
        reader.expect(',').unwrap();
        assert_eq!(reader.length().unwrap().unit, Unit::ViewportWidth);
        reader.expect(',').unwrap();
        assert_eq!(reader.length().unwrap().unit, Unit::ViewportHeight);
        assert!(matches!(
            reader.length(),
            Err(SceneError::InvalidNumber { offset: 16, .. })
        ));
    }

    #[test]
    fn test_bad_unit_reports_offset() {
        let mut reader = SceneReader::new("10q");
        assert!(matches!(
            reader.length(),
            Err(SceneError::InvalidUnit { found: 'q', offset: 2 })
        ));
    }

    #[test]
    fn test_field_stops_at_delimiters() {
        let mut reader = SceneReader::new("Your name, please)");
        assert_eq!(reader.field(), "Your name");
        assert!(reader.eat(','));
        assert_eq!(reader.field(), " please");
        assert_eq!(reader.peek(), Some(')'));
    }

    #[test]
    fn test_escaped_delimiters_stay_in_field() {
        let mut reader = SceneReader::new(r"Name\, first \(a\|b\) c:\\x,next");
        assert_eq!(reader.field(), r"Name, first (a|b) c:\x");
        assert!(reader.eat(','));
        assert_eq!(reader.field(), "next");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_unsigned_rejects_values_that_do_not_fit() {
        let mut reader = SceneReader::new("16,-1,4294967296");
        assert_eq!(reader.unsigned::<u32>().unwrap(), 16);
        assert!(reader.eat(','));
        assert!(matches!(reader.unsigned::<u32>(), Err(SceneError::InvalidNumber { ref text, offset: 3 }) if text == "-1"));
        assert!(reader.eat(','));
        assert!(matches!(reader.unsigned::<u32>(), Err(SceneError::InvalidNumber { offset: 6, .. })));
    }

    #[test]
    fn test_transform() {
        let mut reader = SceneReader::new("{1,2,3;0,0.5,0;1,1,2}");
        let transform = reader.transform().unwrap();
        assert_eq!(transform.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.rotation.y, 0.5);
        assert_eq!(transform.scale.z, 2.0);
    }

    #[test]
    fn test_expect_mismatch_and_eof() {
        let mut reader = SceneReader::new("(");
        assert!(matches!(
            reader.expect(')'),
            Err(SceneError::Expected { expected: ')', found: '(', offset: 0 })
        ));
        assert!(matches!(reader.expect(')'), Err(SceneError::UnexpectedEof { offset: 1 })));
    }

    #[test]
    fn test_color() {
        let mut reader = SceneReader::new("#0a0B0cff]");
        assert_eq!(reader.color().unwrap(), Color::new(10, 11, 12, 255));
        let mut reader = SceneReader::new("#12]");
        assert!(matches!(reader.color(), Err(SceneError::InvalidColor { .. })));
    }
}
