use crate::config::IngestConfig;
use crate::error::{CoreError, CoreResult};
use crate::model::{ImageAsset, PageImage};
use crate::text_cleanup::{cleanup_extracted_text, strip_headers_footers};
use base64::Engine;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Wrapper around the pdfium library, performing the raster/extract work of
/// the Document Extractor (§4.1) on a blocking thread.
pub struct PdfEngine {
    pdfium: Pdfium,
}

impl PdfEngine {
    pub fn new() -> CoreResult<Self> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("."))
            })
            .map_err(|e| {
                CoreError::Pdfium(format!(
                    "failed to load pdfium library: {e}. Install pdfium: download from \
                     https://github.com/bblanchon/pdfium-binaries/releases and place \
                     libpdfium.so/.dylib on the system path or in the working directory."
                ))
            })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    pub fn page_count(doc: &PdfDocument) -> u32 {
        doc.pages().len() as u32
    }

    fn render_page_as_image(page: &PdfPage, dpi: u32) -> CoreResult<(String, Vec<u8>)> {
        let scale = dpi as f32 / 72.0;
        let width = (page.width().value * scale) as i32;
        let height = (page.height().value * scale) as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| CoreError::Image(format!("failed to render page: {e}")))?;

        let img: DynamicImage = bitmap.as_image();
        let mut png_bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut png_bytes);
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| CoreError::Image(format!("failed to encode page PNG: {e}")))?;

        let b64 = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
        Ok((b64, png_bytes))
    }

    fn extract_page_text(page: &PdfPage) -> String {
        page.text().map(|t| t.all()).unwrap_or_default().trim().to_string()
    }

    fn extract_page_images(
        page: &PdfPage,
        page_num: u32,
        out_dir: &Path,
        config: &IngestConfig,
    ) -> CoreResult<Vec<ImageAsset>> {
        let mut assets = Vec::new();
        let mut idx: u32 = 0;

        for object in page.objects().iter() {
            if object.object_type() != PdfPageObjectType::Image {
                continue;
            }
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            let raw_image: DynamicImage = match image_object.get_raw_image() {
                Ok(img) => img,
                Err(_) => continue,
            };

            let w = raw_image.width();
            let h = raw_image.height();
            if !config.image_size_ok(w, h) {
                continue;
            }

            idx += 1;
            let mut png_bytes = Vec::new();
            let mut cursor = std::io::Cursor::new(&mut png_bytes);
            if raw_image.write_to(&mut cursor, image::ImageFormat::Png).is_err() {
                continue;
            }

            let filename = format!("image_p{page_num}_{idx}.png");
            let full_path = out_dir.join(&filename);
            if std::fs::write(&full_path, &png_bytes).is_err() {
                continue;
            }

            assets.push(ImageAsset {
                page: page_num,
                width: w,
                height: h,
                bytes: png_bytes,
                static_path: filename,
            });
        }

        Ok(assets)
    }

    /// Render every page and extract its embedded images, synchronously.
    /// Runs under `tokio::task::spawn_blocking` because pdfium is not async.
    pub fn extract(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
        config: &IngestConfig,
    ) -> CoreResult<Vec<PageImage>> {
        std::fs::create_dir_all(out_dir)?;

        let document = self
            .pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| CoreError::Pdf(format!("failed to open PDF '{}': {e}", pdf_path.display())))?;

        let page_count = Self::page_count(&document);
        let mut pages = Vec::with_capacity(page_count as usize);
        let mut page_texts: Vec<(u32, String)> = Vec::with_capacity(page_count as usize);

        for (i, page) in document.pages().iter().enumerate() {
            let page_num = i as u32 + 1;
            let (base64, png_bytes) = Self::render_page_as_image(&page, config.page_dpi)?;
            let raw_text = Self::extract_page_text(&page);
            let cleaned_text = cleanup_extracted_text(&raw_text);
            let images = Self::extract_page_images(&page, page_num, out_dir, config)?;

            pages.push(PageImage {
                page: page_num,
                png_bytes,
                base64,
                images,
                hint_text: None,
            });
            page_texts.push((i as u32, cleaned_text));
        }

        let (headers, footers) = strip_headers_footers(&mut page_texts);
        if !headers.is_empty() || !footers.is_empty() {
            tracing::debug!(
                "extraction: stripped {} repeated header line(s), {} footer line(s) across {} page(s)",
                headers.len(),
                footers.len(),
                page_texts.len()
            );
        }

        for (page, (_, text)) in pages.iter_mut().zip(page_texts.into_iter()) {
            page.hint_text = if text.is_empty() { None } else { Some(text) };
        }

        Ok(pages)
    }
}

/// Convert a DOCX file to PDF using a headless office tool (§4.1, §B.7).
/// The pipeline operates only on PDFs downstream; DOCX inputs are converted
/// first. Requires `libreoffice` on PATH.
pub async fn docx_to_pdf(docx_path: &Path, out_dir: &Path) -> CoreResult<PathBuf> {
    tokio::fs::create_dir_all(out_dir).await?;

    let status = tokio::process::Command::new("libreoffice")
        .args([
            "--headless",
            "--convert-to",
            "pdf",
            "--outdir",
            out_dir.to_str().ok_or_else(|| {
                CoreError::Config("output directory path is not valid UTF-8".into())
            })?,
            docx_path.to_str().ok_or_else(|| {
                CoreError::UnsupportedInput("DOCX path is not valid UTF-8".into())
            })?,
        ])
        .status()
        .await
        .map_err(|e| {
            CoreError::UnsupportedInput(format!(
                "could not invoke libreoffice for DOCX conversion: {e}. \
                 Install libreoffice or submit a PDF directly."
            ))
        })?;

    if !status.success() {
        return Err(CoreError::UnsupportedInput(format!(
            "libreoffice exited with status {status} converting '{}'",
            docx_path.display()
        )));
    }

    let stem = docx_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CoreError::UnsupportedInput("DOCX filename has no stem".into()))?;
    Ok(out_dir.join(format!("{stem}.pdf")))
}
