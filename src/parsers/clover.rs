/// Parser for Clover XML coverage reports.
///
/// Clover XML structure (as produced by `jest --coverageReporters=clover`,
/// PHPUnit, OpenClover and friends):
///
///   <coverage generated="..." clover="3.2.0">
///     <project timestamp="..." name="All files">
///       <metrics .../>
///       <file name="one.js" path="/abs/path/src/one.js">
///         <metrics statements="10" coveredstatements="8"
///                  conditionals="4" coveredconditionals="2"
///                  methods="3" coveredmethods="3"/>
///         <line num="1" count="5" type="stmt"/>
///         <line num="3" count="0" type="cond" truecount="0" falsecount="1"/>
///       </file>
///       <package name="lib">
///         <file ...>...</file>
///       </package>
///     </project>
///   </coverage>
///
/// Files may sit under any mix of `<project>` and `<package>` groups; they
/// are flattened into one sequence in document order. Only the `<metrics>`
/// element that is a direct child of `<file>` is read, so per-class metrics
/// nested deeper do not overwrite the file totals.
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{get_attr, numeric_attr, xml_err, xml_reader};
use crate::error::{ReviewError, Result};
use crate::model::*;

/// The two grouping elements a Clover report may nest files under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Project,
    Package,
}

impl Group {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"project" => Some(Group::Project),
            b"package" => Some(Group::Package),
            _ => None,
        }
    }
}

/// Parse a Clover document from raw bytes. Any structural problem fails the
/// whole parse; no partial document is returned.
pub fn parse(input: &[u8]) -> Result<CoverageDocument> {
    let mut reader = xml_reader(input);
    let mut buf = Vec::new();
    let mut walk = Walk::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(xml_err(e, &reader)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                walk.open(e, &reader)?;
                walk.stack.push(e.name().as_ref().to_vec());
                if let Some(group) = Group::from_tag(e.name().as_ref()) {
                    walk.groups.push(group);
                }
            }
            Ok(Event::Empty(ref e)) => {
                walk.open(e, &reader)?;
                // A self-closing element closes at the depth it opened.
                if e.name().as_ref() == b"file" {
                    walk.finish_file(walk.stack.len() + 1);
                }
            }
            Ok(Event::End(ref e)) => {
                walk.stack.pop();
                if Group::from_tag(e.name().as_ref()).is_some() {
                    walk.groups.pop();
                }
                if e.name().as_ref() == b"file" {
                    walk.finish_file(walk.stack.len() + 1);
                }
            }
            _ => {}
        }
        buf.clear();
    }

    walk.finish(&reader)
}

/// Document walk state.
#[derive(Default)]
struct Walk {
    doc: CoverageDocument,
    stack: Vec<Vec<u8>>,
    groups: Vec<Group>,
    saw_root: bool,
    /// The open file and the element depth of its direct children.
    current: Option<(FileRecord, usize)>,
    has_metrics: bool,
}

impl Walk {
    fn open(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<()> {
        let name = e.name();
        let tag = name.as_ref();

        if self.stack.is_empty() {
            if self.saw_root {
                return Err(ReviewError::Malformed(
                    "more than one root element".to_string(),
                ));
            }
            if tag != b"coverage" {
                return Err(ReviewError::Malformed(format!(
                    "expected <coverage> root element, found <{}>",
                    String::from_utf8_lossy(tag)
                )));
            }
            self.saw_root = true;
            if get_attr(e, b"clover", reader)?.is_none() {
                tracing::debug!("<coverage> root has no `clover` attribute");
            }
            return Ok(());
        }

        match tag {
            b"file" => self.open_file(e, reader),
            b"metrics" if self.is_file_child() => {
                if self.has_metrics {
                    tracing::debug!("ignoring repeated <metrics> inside <file>");
                    return Ok(());
                }
                let metrics = read_metrics(e, reader)?;
                if let Some((file, _)) = self.current.as_mut() {
                    file.metrics = metrics;
                }
                self.has_metrics = true;
                Ok(())
            }
            b"line" if self.is_file_child() => {
                let Some(number) = numeric_attr::<u32>(e, b"num", reader)? else {
                    tracing::debug!("skipping <line> without a `num` attribute");
                    return Ok(());
                };
                let hit_count = numeric_attr::<u64>(e, b"count", reader)?.unwrap_or(0);
                let kind = LineKind::from_attr(get_attr(e, b"type", reader)?.as_deref());
                if let Some((file, _)) = self.current.as_mut() {
                    file.lines.push(LineRecord {
                        number,
                        hit_count,
                        kind,
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn open_file(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<()> {
        if self.current.is_some() {
            return Err(ReviewError::Malformed(
                "<file> nested inside another <file>".to_string(),
            ));
        }
        let name = get_attr(e, b"name", reader)?;
        // `path` is authoritative; `name` is only a basename.
        let path = match get_attr(e, b"path", reader)? {
            Some(path) => path,
            None => name.clone().ok_or_else(|| {
                ReviewError::Malformed(format!(
                    "<file> without `path` or `name` at position {}",
                    reader.buffer_position()
                ))
            })?,
        };

        if self.groups.is_empty() {
            tracing::warn!(path = %path, "ignoring <file> outside any <project> or <package>");
            return Ok(());
        }

        let mut file = FileRecord::new(path);
        file.name = name;
        self.current = Some((file, self.stack.len() + 1));
        self.has_metrics = false;
        Ok(())
    }

    fn is_file_child(&self) -> bool {
        matches!(self.current, Some((_, depth)) if depth == self.stack.len())
    }

    /// Close the open file if it was opened at `depth`.
    fn finish_file(&mut self, depth: usize) {
        if matches!(self.current, Some((_, d)) if d == depth) {
            if let Some((file, _)) = self.current.take() {
                self.doc.files.push(file);
            }
        }
    }

    fn finish(self, reader: &Reader<&[u8]>) -> Result<CoverageDocument> {
        if let Some(open) = self.stack.last() {
            return Err(ReviewError::Malformed(format!(
                "unexpected end of document inside <{}> at position {}",
                String::from_utf8_lossy(open),
                reader.buffer_position()
            )));
        }
        if !self.saw_root {
            return Err(ReviewError::Malformed(
                "missing <coverage> root element".to_string(),
            ));
        }
        Ok(self.doc)
    }
}

fn read_metrics(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<FileMetrics> {
    let count = |key: &[u8]| numeric_attr::<u64>(e, key, reader).map(Option::unwrap_or_default);
    Ok(FileMetrics {
        statements: count(b"statements")?,
        covered_statements: count(b"coveredstatements")?,
        conditionals: count(b"conditionals")?,
        covered_conditionals: count(b"coveredconditionals")?,
        methods: count(b"methods")?,
        covered_methods: count(b"coveredmethods")?,
    })
}
