// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Defines primitives in control files.

A source description is a single *paragraph* of RFC822-style fields. Each field
starts with `Name: value` in the first column and may continue over following lines
that begin with whitespace. The `Files` and `Checksums-*` fields use such
continuation lines to hold one entry per line.

See <https://www.debian.org/doc/debian-policy/ch-controlfields.html>
for the canonical source of truth for how control files work.
*/

use {
    crate::error::{DscError, Result},
    log::warn,
    std::{
        borrow::Cow,
        collections::HashMap,
        io::{BufRead, Write},
    },
};

/// A field in a control file.
///
/// The text following the colon is stored verbatim, including any line breaks and
/// leading whitespace of continuation lines. This allows fields to be written back
/// out byte for byte as they were read.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlField<'a> {
    name: Cow<'a, str>,
    raw_value: Cow<'a, str>,
}

impl<'a> ControlField<'a> {
    /// Construct an instance from a field name and value.
    ///
    /// A value starting with a newline is written with its first line on a
    /// continuation line. Otherwise it follows the colon and a space.
    pub fn new(name: Cow<'a, str>, value: Cow<'a, str>) -> Self {
        let raw_value = if value.starts_with('\n') {
            value
        } else {
            Cow::Owned(format!(" {}", value))
        };

        Self { name, raw_value }
    }

    /// Construct an instance from the exact text following the colon.
    pub fn from_raw(name: Cow<'a, str>, raw_value: Cow<'a, str>) -> Self {
        Self { name, raw_value }
    }

    /// The name of this field.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Obtain the value as a [&str].
    ///
    /// Leading and trailing whitespace is removed. Line breaks and indentation of
    /// continuation lines are retained.
    pub fn value_str(&self) -> &str {
        self.raw_value.trim()
    }

    /// Obtain the exact text following the colon.
    pub fn raw_value(&self) -> &str {
        self.raw_value.as_ref()
    }

    /// Obtain an iterator of words in the value.
    pub fn iter_words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.raw_value.split_ascii_whitespace())
    }

    /// Obtain an iterator of lines in the value.
    ///
    /// Leading and trailing whitespace is stripped from each line and empty lines
    /// are skipped.
    pub fn iter_lines(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(
            self.raw_value
                .lines()
                .map(|x| x.trim())
                .filter(|x| !x.is_empty()),
        )
    }

    /// Append a continuation line to the value.
    ///
    /// Existing lines are preserved verbatim.
    pub fn append_line(&mut self, line: &str) {
        let value = self.raw_value.to_mut();
        value.push_str("\n ");
        value.push_str(line);
    }

    /// Write the contents of this field to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.name.as_bytes())?;
        writer.write_all(b":")?;
        writer.write_all(self.raw_value.as_bytes())?;
        writer.write_all(b"\n")
    }
}

impl<'a> std::fmt::Display for ControlField<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:{}", self.name, self.raw_value)
    }
}

/// A paragraph in a control file.
///
/// A paragraph is an ordered series of control fields.
///
/// Field names are case insensitive on read and case preserving on set.
///
/// Paragraphs can only contain a single occurrence of a field. Setting a field
/// that already exists replaces its value in its original position.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlParagraph<'a> {
    fields: Vec<ControlField<'a>>,
}

impl<'a> ControlParagraph<'a> {
    /// Parse the first paragraph of a control file from a reader.
    ///
    /// Additional paragraphs are ignored. An empty source results in an empty paragraph.
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<ControlParagraph<'static>> {
        let mut paragraphs = ControlParagraphReader::new(reader);

        let paragraph = paragraphs.next().transpose()?.unwrap_or_default();

        let extra = paragraphs.try_fold(0usize, |count, p| p.map(|_| count + 1))?;
        if extra > 0 {
            warn!("ignoring {} paragraphs after the first", extra);
        }

        Ok(paragraph)
    }

    /// Parse the first paragraph of a control file from a string.
    pub fn parse_str(s: &str) -> Result<ControlParagraph<'static>> {
        Self::parse_reader(std::io::BufReader::new(s.as_bytes()))
    }

    /// Whether the paragraph is empty.
    ///
    /// Empty is defined by the lack of any fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The number of fields in this paragraph.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Set the value of a field via a [ControlField].
    ///
    /// If a field with the same name (case insensitive compare) already exists, the old value
    /// will be replaced by the incoming value.
    pub fn set_field(&mut self, field: ControlField<'a>) {
        if let Some(existing) = self.field_mut(field.name()) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    /// Set the value of a field defined via strings.
    pub fn set_field_from_string(&mut self, name: Cow<'a, str>, value: Cow<'a, str>) {
        self.set_field(ControlField::new(name, value));
    }

    /// Whether a named field is present in this paragraph.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Iterate over fields in this paragraph.
    ///
    /// Iteration order is insertion order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField<'a>> {
        self.fields.iter()
    }

    /// Obtain the field with a given name in this paragraph.
    pub fn field(&self, name: &str) -> Option<&'_ ControlField<'a>> {
        self.fields
            .iter()
            .find(|f| f.name.as_ref().eq_ignore_ascii_case(name))
    }

    /// Obtain a mutable reference to the field with a given name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut ControlField<'a>> {
        self.fields
            .iter_mut()
            .find(|f| f.name.as_ref().eq_ignore_ascii_case(name))
    }

    /// Obtain a field by name, treating `_` as equivalent to `-`.
    ///
    /// The literal name is tried first. e.g. `package_list` finds `Package-List`.
    pub fn field_normalized(&self, name: &str) -> Option<&'_ ControlField<'a>> {
        self.field(name).or_else(|| {
            if name.contains('_') {
                self.field(&name.replace('_', "-"))
            } else {
                None
            }
        })
    }

    /// Obtain the raw string value of the named field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value_str())
    }

    /// Obtain the string value of a field that must be present.
    pub fn required_field_str(&self, name: &str) -> Result<&str> {
        self.field_str(name)
            .ok_or_else(|| DscError::ControlRequiredFieldMissing(name.to_string()))
    }

    /// Obtain an iterator of words in the named field.
    pub fn iter_field_words(&self, name: &str) -> Option<Box<dyn Iterator<Item = &str> + '_>> {
        self.field(name).map(|f| f.iter_words())
    }

    /// Convert this paragraph to a [HashMap].
    ///
    /// Values are the trimmed string value of each field.
    pub fn as_str_hash_map(&self) -> HashMap<&str, &str> {
        HashMap::from_iter(
            self.fields
                .iter()
                .map(|field| (field.name.as_ref(), field.value_str())),
        )
    }

    /// Serialize the paragraph to a writer.
    ///
    /// A trailing newline is written as part of the final field.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for field in &self.fields {
            field.write(writer)?;
        }

        Ok(())
    }
}

impl<'a> std::fmt::Display for ControlParagraph<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            write!(f, "{}", field)?;
        }

        Ok(())
    }
}

/// Holds parsing state for Debian control files.
///
/// Instances of this type are essentially fed lines of text and periodically emit
/// [ControlParagraph] instances as they are completed.
#[derive(Clone, Debug, Default)]
pub struct ControlFileParser {
    paragraph: ControlParagraph<'static>,
    field: Option<String>,
}

impl ControlFileParser {
    /// Write a line to the parser.
    ///
    /// If the line terminates an in-progress paragraph, that paragraph will be returned.
    /// Otherwise `Ok(None)` is returned.
    ///
    /// `Err` is returned if the control file in invalid.
    pub fn write_line(&mut self, line: &str) -> Result<Option<ControlParagraph<'static>>> {
        let is_empty_line = line.trim().is_empty();
        let is_indented = line.starts_with(|c: char| c == ' ' || c == '\t');

        let current_field = self.field.take();

        // Empty lines signify the end of a paragraph. Flush any state.
        if is_empty_line {
            if let Some(field) = current_field {
                self.flush_field(field)?;
            }

            return Ok(if self.paragraph.is_empty() {
                None
            } else {
                Some(std::mem::take(&mut self.paragraph))
            });
        }

        match (current_field, is_indented) {
            // An unindented line begins a new field.
            (Some(v), false) => {
                self.flush_field(v)?;
                self.field = Some(line.to_string());
            }
            (None, _) => {
                self.field = Some(line.to_string());
            }
            // Continuation of the current field. Line breaks are retained.
            (Some(v), true) => {
                self.field = Some(v + line);
            }
        }

        Ok(None)
    }

    /// Finish parsing, consuming self.
    ///
    /// If a non-empty paragraph is present in the instance, it will be returned. Else if there
    /// is no unflushed state, None is returned.
    pub fn finish(mut self) -> Result<Option<ControlParagraph<'static>>> {
        if let Some(field) = self.field.take() {
            self.flush_field(field)?;
        }

        Ok(if self.paragraph.is_empty() {
            None
        } else {
            Some(self.paragraph)
        })
    }

    fn flush_field(&mut self, v: String) -> Result<()> {
        let (name, value) = v.split_once(':').ok_or_else(|| {
            DscError::ControlParse(format!(
                "error parsing line '{}'; missing colon",
                v.trim_end()
            ))
        })?;

        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(DscError::ControlParse(format!(
                "error parsing line '{}'; invalid field name",
                v.trim_end()
            )));
        }

        let value = value.strip_suffix('\n').unwrap_or(value);
        let value = value.strip_suffix('\r').unwrap_or(value);

        self.paragraph.set_field(ControlField::from_raw(
            Cow::Owned(name.to_string()),
            Cow::Owned(value.to_string()),
        ));

        Ok(())
    }
}

/// A reader for [ControlParagraph].
///
/// Instances are bound to a reader, which is capable of feeding lines into a parser.
///
/// Instances can be consumed as an iterator. Each call into the iterator will attempt to
/// read a full paragraph from the underlying reader.
pub struct ControlParagraphReader<R: BufRead> {
    reader: R,
    parser: Option<ControlFileParser>,
}

impl<R: BufRead> ControlParagraphReader<R> {
    /// Create a new instance bound to a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: Some(ControlFileParser::default()),
        }
    }

    fn get_next(&mut self) -> Result<Option<ControlParagraph<'static>>> {
        let mut parser = match self.parser.take() {
            Some(parser) => parser,
            None => return Ok(None),
        };

        loop {
            let mut line = String::new();

            let bytes_read = self.reader.read_line(&mut line)?;

            if bytes_read != 0 {
                if let Some(paragraph) = parser.write_line(&line)? {
                    self.parser.replace(parser);
                    return Ok(Some(paragraph));
                }
                // Continue reading.
            } else {
                return parser.finish();
            }
        }
    }
}

impl<R: BufRead> Iterator for ControlParagraphReader<R> {
    type Item = Result<ControlParagraph<'static>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next().transpose()
    }
}
