#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

fn megabytes(size: usize) -> String {
    return format!("{:.2} MB", size as f64 / 1024.0 / 1024.0);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: &str, media_type: &str, bytes: Vec<u8>) -> Document {
        return Document {
            name: name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        };
    }

    /// Guesses the media type from the file extension.
    pub fn from_file_name(name: &str, bytes: Vec<u8>) -> Document {
        let media_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        return Document::new(name, &media_type, bytes);
    }

    pub fn size(&self) -> usize {
        return self.bytes.len();
    }

    pub fn size_display(&self) -> String {
        return megabytes(self.size());
    }

    pub fn is_pdf(&self) -> bool {
        return self.media_type == PDF_MEDIA_TYPE;
    }
}

/// Documents waiting to be ingested. Only PDFs are ever admitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentBatch {
    documents: Vec<Document>,
}

impl DocumentBatch {
    /// Appends the PDFs from `documents` in order and drops everything else.
    /// Returns how many were accepted.
    pub fn add(&mut self, documents: Vec<Document>) -> usize {
        let before = self.documents.len();
        for document in documents {
            if !document.is_pdf() {
                tracing::debug!(
                    name = document.name,
                    media_type = document.media_type,
                    "Skipping non-PDF document"
                );
                continue;
            }

            self.documents.push(document);
        }

        return self.documents.len() - before;
    }

    pub fn remove(&mut self, idx: usize) -> Option<Document> {
        if idx >= self.documents.len() {
            return None;
        }

        return Some(self.documents.remove(idx));
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn documents(&self) -> &[Document] {
        return &self.documents;
    }

    pub fn len(&self) -> usize {
        return self.documents.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.documents.is_empty();
    }

    pub fn total_size(&self) -> usize {
        return self.documents.iter().map(|e| return e.size()).sum();
    }

    pub fn size_display(&self) -> String {
        return megabytes(self.total_size());
    }
}
