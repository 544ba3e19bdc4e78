//! Slide document assembly.
//!
//! [`SlideAssembler`] writes one PDF page per retained frame. Every page
//! has the size of the first frame (one pixel per point), plus the header
//! margin when one is configured, and each frame is drawn at its pixel size
//! with its top-left corner at `(0, margin)` from the top of the page.
//!
//! JPEG frames in gray or RGB are embedded untouched; anything else is
//! decoded and embedded as raw 8-bit RGB.
//!
//! Header text is set in Helvetica-Bold under `WinAnsiEncoding`, which
//! covers Latin-1 and common typographic punctuation. Other characters are
//! printed as `?`.
//!
//! # Example
//!
//! ```no_run
//! use slidegen::{DocumentOptions, ScratchStore, SlideAssembler};
//!
//! let store = ScratchStore::at("output0");
//! let assembler = SlideAssembler::new(DocumentOptions::new().with_header("Lecture 3"));
//! let summary = assembler.assemble_files(&store.frame_paths()?, store.document_path())?;
//! println!("{} pages of {}x{}", summary.pages, summary.page_width, summary.page_height);
//! # Ok::<(), slidegen::SlideError>(())
//! ```

use std::{
    fs::{self, File},
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
};

use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{
    Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{configuration::DocumentOptions, error::SlideError};

const HEADER_FONT_SIZE: i64 = 8;
const HEADER_INSET: i64 = 10;

/// Result of assembling a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Number of pages written.
    pub pages: usize,
    /// Page width in points.
    pub page_width: u32,
    /// Page height in points, margin included.
    pub page_height: u32,
}

/// An image ready to be embedded as a PDF XObject.
struct PageImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    /// `Some("DCTDecode")` for pass-through JPEG data.
    filter: Option<&'static str>,
    data: Vec<u8>,
}

impl PageImage {
    fn from_encoded(bytes: Vec<u8>) -> Result<Self, SlideError> {
        if image::guess_format(&bytes)? == ImageFormat::Jpeg {
            let ((width, height), color_type) = {
                let decoder = ImageReader::with_format(Cursor::new(&bytes), ImageFormat::Jpeg)
                    .into_decoder()?;
                (decoder.dimensions(), decoder.color_type())
            };
            let color_space = match color_type {
                ColorType::L8 => Some("DeviceGray"),
                ColorType::Rgb8 => Some("DeviceRGB"),
                _ => None,
            };
            if let Some(color_space) = color_space {
                return Ok(Self {
                    width,
                    height,
                    color_space,
                    filter: Some("DCTDecode"),
                    data: bytes,
                });
            }
        }

        Ok(Self::from_image(&image::load_from_memory(&bytes)?))
    }

    fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            color_space: "DeviceRGB",
            filter: None,
            data: rgb.into_raw(),
        }
    }

    fn into_stream(self) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(self.width),
            "Height" => i64::from(self.height),
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
        };
        match self.filter {
            Some(filter) => {
                dict.set("Filter", filter);
                Stream::new(dict, self.data).with_compression(false)
            }
            None => Stream::new(dict, self.data),
        }
    }
}

/// Encode `text` for a standard Type 1 font under `WinAnsiEncoding`.
/// Characters the encoding lacks become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|character| match character {
            ' '..='~' | '\u{a0}'..='\u{ff}' => character as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

/// Writes retained frames into a paginated PDF.
#[derive(Debug, Clone, Default)]
pub struct SlideAssembler {
    options: DocumentOptions,
}

impl SlideAssembler {
    /// Assembler with the given page layout.
    pub fn new(options: DocumentOptions) -> Self {
        Self { options }
    }

    /// The page layout in use.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Read encoded frames from `paths`, in order, and write them to
    /// `output`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::EmptySelection`] if `paths` is empty, and I/O,
    /// image or document errors otherwise.
    pub fn assemble_files<P: AsRef<Path>>(
        &self,
        paths: &[PathBuf],
        output: P,
    ) -> Result<DocumentSummary, SlideError> {
        if paths.is_empty() {
            return Err(SlideError::EmptySelection);
        }
        let pages = paths
            .iter()
            .map(|path| PageImage::from_encoded(fs::read(path)?))
            .collect::<Result<Vec<_>, SlideError>>()?;
        self.write(pages, output.as_ref())
    }

    /// Write in-memory frames to `output`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::EmptySelection`] if `images` is empty, and I/O
    /// or document errors otherwise.
    pub fn assemble_images<P: AsRef<Path>>(
        &self,
        images: &[DynamicImage],
        output: P,
    ) -> Result<DocumentSummary, SlideError> {
        if images.is_empty() {
            return Err(SlideError::EmptySelection);
        }
        let pages = images.iter().map(PageImage::from_image).collect();
        self.write(pages, output.as_ref())
    }

    fn write(&self, images: Vec<PageImage>, output: &Path) -> Result<DocumentSummary, SlideError> {
        let first = images.first().ok_or(SlideError::EmptySelection)?;
        let margin = self.options.margin();
        let page_width = first.width;
        let page_height = first
            .height
            .checked_add(margin)
            .ok_or(SlideError::PageOverflow {
                height: first.height,
                margin,
            })?;
        let page_count = images.len();

        log::debug!(
            "Assembling {} pages of {}x{} (margin={}) into {}",
            page_count,
            page_width,
            page_height,
            margin,
            output.display()
        );

        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let font_id = self.options.header().map(|_| {
            document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica-Bold",
                "Encoding" => "WinAnsiEncoding",
            })
        });

        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            i64::from(page_width).into(),
            i64::from(page_height).into(),
        ];

        let mut kids: Vec<Object> = Vec::with_capacity(page_count);
        for image in images {
            let (width, height) = (i64::from(image.width), i64::from(image.height));
            let image_id = document.add_object(image.into_stream());

            let content = self.page_content(width, height, i64::from(page_height), margin);
            let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));

            let mut resources = dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            };
            if let Some(font_id) = font_id {
                resources.set("Font", dictionary! { "F1" => font_id });
            }

            let page_id: ObjectId = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Resources" => resources,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        document.compress();

        let mut writer = BufWriter::new(File::create(output)?);
        document.save_to(&mut writer)?;
        writer.flush()?;

        log::info!("Wrote {} pages to {}", page_count, output.display());
        Ok(DocumentSummary {
            pages: page_count,
            page_width,
            page_height,
        })
    }

    /// Draw the image below the margin and, when configured, the header
    /// text inside it. PDF space grows upwards from the bottom-left corner.
    fn page_content(&self, width: i64, height: i64, page_height: i64, margin: u32) -> Content {
        let bottom = page_height - i64::from(margin) - height;
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    bottom.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ];

        if let Some(text) = self.options.header() {
            let baseline = page_height - (i64::from(margin) + HEADER_FONT_SIZE) / 2;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), HEADER_FONT_SIZE.into()],
                ),
                Operation::new("Td", vec![HEADER_INSET.into(), baseline.into()]),
                Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
                Operation::new("ET", vec![]),
            ]);
        }

        Content { operations }
    }
}
