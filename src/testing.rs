//! Shared test fixtures

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use zip::write::FileOptions;

use crate::error::Result;
use crate::unit::{Invokable, NativeUnit, UnitDefiner};

/// Build a zip archive holding `entries`, in order
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub origin: String,
    pub bytes: Vec<u8>,
}

/// Definer that records what it defined and every invocation of its units
#[derive(Default)]
pub struct RecordingDefiner {
    defined: Mutex<Vec<Definition>>,
    invocations: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl RecordingDefiner {
    pub fn defined(&self) -> Vec<Definition> {
        self.defined.lock().unwrap().clone()
    }

    pub fn last(&self) -> Definition {
        self.defined
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("nothing defined")
    }

    pub fn invocations(&self) -> Vec<(String, Vec<String>)> {
        self.invocations.lock().unwrap().clone()
    }
}

impl UnitDefiner for RecordingDefiner {
    fn define(&self, name: &str, origin: &str, bytes: Vec<u8>) -> Result<Arc<dyn Invokable>> {
        self.defined.lock().unwrap().push(Definition {
            name: name.to_string(),
            origin: origin.to_string(),
            bytes,
        });

        let log = self.invocations.clone();
        let unit_name = name.to_string();
        Ok(Arc::new(NativeUnit::new(name, move |args| {
            log.lock().unwrap().push((unit_name.clone(), args.to_vec()));
            Ok(())
        })))
    }
}
