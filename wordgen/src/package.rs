use crate::{xml::XmlDocument, WordError, WordResult};
use std::{
    fs,
    io::{Cursor, Read, Write},
    path::Path,
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT: &str = "word/document.xml";

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// The zip entries of a Word document, in their original order
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<Part>,
}

impl DocxPackage {
    /// # Errors
    ///
    /// Fails if the file can not be read or is not a Word document
    pub fn open(path: impl AsRef<Path>) -> WordResult<DocxPackage> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        DocxPackage::from_bytes(&bytes).map_err(|e| match e {
            WordError::NotDocx(_) => WordError::NotDocx(path.display().to_string()),
            e => e,
        })
    }

    /// # Errors
    ///
    /// Fails if `bytes` are not a zip archive or the archive has no `word/document.xml`
    pub fn from_bytes(bytes: &[u8]) -> WordResult<DocxPackage> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
            });
        }

        let package = DocxPackage { parts };
        if package.part(DOCUMENT).is_none() {
            return Err(WordError::NotDocx("the archive".to_string()));
        }

        Ok(package)
    }

    #[must_use]
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Replace the content of a part, adding it at the end when missing
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// `word/header1.xml`, `word/footer2.xml`...
    #[must_use]
    pub fn header_footer_parts(&self) -> Vec<String> {
        self.part_names()
            .filter(|n| {
                n.strip_prefix("word/")
                    .is_some_and(|n| {
                        (n.starts_with("header") || n.starts_with("footer"))
                            && n.ends_with(".xml")
                            && !n.contains('/')
                    })
            })
            .map(str::to_string)
            .collect()
    }

    /// # Errors
    ///
    /// Fails if the part is missing or is not well formed
    pub fn xml_part(&self, name: &str) -> WordResult<XmlDocument> {
        let bytes = self
            .part(name)
            .ok_or_else(|| WordError::MissingPart(name.to_string()))?;
        XmlDocument::parse(bytes)
    }

    /// # Errors
    ///
    /// Fails if the part can not be serialized
    pub fn set_xml_part(&mut self, name: &str, doc: &XmlDocument) -> WordResult<()> {
        self.set_part(name, doc.to_bytes()?);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the main document is not well formed
    pub fn document(&self) -> WordResult<XmlDocument> {
        self.xml_part(DOCUMENT)
    }

    /// # Errors
    ///
    /// Fails if the document can not be serialized
    pub fn set_document(&mut self, doc: &XmlDocument) -> WordResult<()> {
        self.set_xml_part(DOCUMENT, doc)
    }

    /// # Errors
    ///
    /// Fails if the archive can not be written
    pub fn to_bytes(&self) -> WordResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// # Errors
    ///
    /// Fails if the archive can not be written
    pub fn save(&self, path: impl AsRef<Path>) -> WordResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_bytes()?)?;
        log::debug!("Wrote {}", path.display());

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};

    #[test]
    fn parts_survive_a_round_trip() {
        let bytes = docx(
            &paragraph("Hello"),
            &[
                ("word/header1.xml", "<w:hdr/>"),
                ("word/footer1.xml", "<w:ftr/>"),
                ("word/media/header.png", "png"),
            ],
        );

        let package = DocxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(
            package.header_footer_parts(),
            vec!["word/header1.xml", "word/footer1.xml"]
        );

        let again = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(
            again.part_names().collect::<Vec<_>>(),
            package.part_names().collect::<Vec<_>>()
        );
        assert_eq!(again.part("word/media/header.png"), Some(&b"png"[..]));

        let texts = again.document().unwrap();
        assert_eq!(texts.root.descendants("w:t")[0].own_text(), "Hello");
    }

    #[test]
    fn saving_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("page.docx");

        let package = DocxPackage::from_bytes(&docx(&paragraph("x"), &[])).unwrap();
        package.save(&path).unwrap();

        assert!(DocxPackage::open(&path).is_ok());
    }

    #[test]
    fn not_a_document() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("xl/workbook.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<workbook/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            DocxPackage::from_bytes(&bytes),
            Err(WordError::NotDocx(_))
        ));
        assert!(matches!(
            DocxPackage::from_bytes(b"plain text"),
            Err(WordError::Zip(_))
        ));
    }
}
