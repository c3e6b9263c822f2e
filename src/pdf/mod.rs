// src/pdf/mod.rs

pub mod processor;

pub use processor::{pdf_to_snippets, PdfDocument, ReferenceDocument, ReferenceLibrary};
