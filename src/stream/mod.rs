//! Streaming JSON list serialization.
//!
//! Large exports are written as `{"<heading>": [ ... ]}` without buffering
//! the result set: a push-model writer emits the envelope and items
//! incrementally, and [`stream_doc`] drives it with a one-element-lookahead
//! ("lagging") pass over the source iterator so the final item can omit the
//! trailing comma without a second pass.
//!
//! Once bytes have been written, a mid-stream failure is not recoverable:
//! the error propagates and the partial output simply ends. The source
//! iterator (the live cursor) is dropped on every exit path, including when
//! the consumer stops reading early.

use crate::core::Result;
use serde::Serialize;
use serde_json::json;
use std::io::Write;

/// Incremental writer for a `{"<heading>": [ ... ]}` document.
pub struct JsonListWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonListWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Emit a complete empty document: `{"<heading>": []}`.
    pub fn write_empty(&mut self, heading: &str) -> Result<()> {
        let doc = json!({ heading: [] });
        serde_json::to_writer(&mut self.out, &doc)?;
        Ok(())
    }

    /// Emit the opening brace, heading and opening bracket.
    pub fn write_open(&mut self, heading: &str) -> Result<()> {
        self.out.write_all(b"{")?;
        serde_json::to_writer(&mut self.out, heading)?;
        self.out.write_all(b": [")?;
        Ok(())
    }

    /// Emit one item; every item except the last is followed by a comma.
    pub fn write_item<T: Serialize>(&mut self, item: &T, is_last: bool) -> Result<()> {
        serde_json::to_writer(&mut self.out, item)?;
        if !is_last {
            self.out.write_all(b", ")?;
        }
        Ok(())
    }

    /// Emit the closing bracket and brace.
    pub fn write_close(&mut self) -> Result<()> {
        self.out.write_all(b"]}")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Stream every item of `iter` under `heading`, holding at most one element
/// of lookahead in memory.
pub fn stream_doc<W, I, T>(out: W, heading: &str, iter: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut writer = JsonListWriter::new(out);
    let mut iter = iter.into_iter();

    // Lag one element behind the cursor so we know which item is last.
    let Some(mut previous) = iter.next() else {
        return writer.write_empty(heading);
    };

    writer.write_open(heading)?;
    for item in iter {
        writer.write_item(&previous, false)?;
        previous = item;
    }
    writer.write_item(&previous, true)?;
    writer.write_close()
}
