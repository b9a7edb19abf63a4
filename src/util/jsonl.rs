//! JSONL writer utility.

use crate::errors::Result;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub struct JsonlWriter {
    w: BufWriter<File>,
}

impl JsonlWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self {
            w: BufWriter::new(f),
        })
    }

    pub fn write_obj<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        serde_json::to_writer(&mut self.w, obj)?;
        self.w.write_all(b"\n")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.w.flush()?;
        Ok(())
    }
}
