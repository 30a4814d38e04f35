// ============================================================
// Layer 4 — Document Loader
// ============================================================
// Loads the passages `ask` reads from: every .txt and .docx file
// in a directory, in file-name order.
//
// .docx files are ZIP archives of XML; docx-rs gives a typed tree:
//   Document → Paragraph → Run → Text
// Text runs within a paragraph are concatenated, paragraphs are
// joined with newlines.
//
// Reference: docx-rs crate documentation

use anyhow::{Context, Result};
use std::{fs, path::Path};
use docx_rs::{read_docx, ReaderError};

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

/// Reads .txt and .docx passages from one directory
pub struct DocumentLoader {
    dir: String,
}

impl DocumentLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for DocumentLoader {
    fn load_all(&self) -> Result<Vec<Document>> {
        let dir = Path::new(&self.dir);
        if !dir.exists() {
            tracing::warn!("Docs directory '{}' does not exist", self.dir);
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
        {
            paths.push(entry?.path());
        }
        paths.sort();

        let mut docs = Vec::new();
        for path in paths {
            let loaded = match path.extension().and_then(|e| e.to_str()) {
                Some("docx") => load_docx(&path),
                Some("txt")  => load_txt(&path),
                _ => continue,
            };
            match loaded {
                Ok(doc) => {
                    tracing::debug!("Loaded: {} ({} chars)", doc.source, doc.text.len());
                    docs.push(doc);
                }
                // One unreadable file should not stop the others
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!("Loaded {} documents from '{}'", docs.len(), self.dir);
        Ok(docs)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn load_txt(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(Document::new(file_name(path), text))
}

fn load_docx(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let docx = read_docx(&bytes)
        .map_err(|e: ReaderError| {
            anyhow::anyhow!("docx-rs parse error in '{}': {:?}", path.display(), e)
        })?;

    let mut paragraphs: Vec<String> = Vec::new();
    for child in &docx.document.children {
        use docx_rs::DocumentChild;

        if let DocumentChild::Paragraph(para) = child {
            let para_text = paragraph_text(para);
            if !para_text.trim().is_empty() {
                paragraphs.push(para_text);
            }
        }
    }

    Ok(Document::new(file_name(path), paragraphs.join("\n")))
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut parts = Vec::new();
    for child in &para.children {
        use docx_rs::{ParagraphChild, RunChild};

        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                if let RunChild::Text(t) = rc {
                    parts.push(t.text.clone());
                }
            }
        }
    }
    parts.join("")
}
