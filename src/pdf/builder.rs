//! Document setup shared by the certificate and the expiry report.

use std::path::PathBuf;

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{render, Alignment, Context, Document, Element, Margins, Mm, PageDecorator, Position, Size};

use super::{fonts, RenderError};

/// Landscape A4, as used by printed certificates.
pub fn a4_landscape() -> Size {
    Size::new(297, 210)
}

/// Creates `genpdf` documents with the registry's fonts and page frame.
pub struct DocumentBuilder {
    title: String,
    paper_size: Size,
    fonts_dir: Option<PathBuf>,
    frame: Option<PageFrame>,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>, paper_size: impl Into<Size>) -> Self {
        Self {
            title: title.into(),
            paper_size: paper_size.into(),
            fonts_dir: None,
            frame: None,
        }
    }

    /// Overrides the directory searched first for fonts.
    pub fn with_fonts_dir(mut self, fonts_dir: Option<PathBuf>) -> Self {
        self.fonts_dir = fonts_dir;
        self
    }

    /// Decorates every page with `frame`. Without a frame the whole page is drawable.
    pub fn with_frame(mut self, frame: PageFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn build(self) -> Result<Document, RenderError> {
        let family = fonts::font_family(self.fonts_dir.as_deref()).map_err(RenderError::FontLoad)?;
        let mut document = Document::new(family);
        document.set_title(self.title);
        document.set_paper_size(self.paper_size);
        if let Some(frame) = self.frame {
            document.set_page_decorator(frame);
        }
        Ok(document)
    }
}

/// Renders a finished document into memory.
pub fn render_to_bytes(document: Document) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    document.render(&mut bytes).map_err(RenderError::Layout)?;
    Ok(bytes)
}

/// Margins, centred heading lines and a "Page N" footer for flowing documents.
pub struct PageFrame {
    margins: Margins,
    heading: Vec<(String, Style)>,
    footer_height: Mm,
    page: usize,
}

impl PageFrame {
    pub fn new(margins: impl Into<Margins>, footer_height: impl Into<Mm>) -> Self {
        Self {
            margins: margins.into(),
            heading: Vec::new(),
            footer_height: footer_height.into(),
            page: 0,
        }
    }

    /// Adds a centred line repeated at the top of every page.
    pub fn with_heading_line(mut self, text: impl Into<String>, style: Style) -> Self {
        self.heading.push((text.into(), style));
        self
    }
}

const HEADING_GAP_MM: i32 = 4;

impl PageDecorator for PageFrame {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: render::Area<'a>,
        style: Style,
    ) -> Result<render::Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);

        for (text, line_style) in &self.heading {
            let mut line = Paragraph::new(text.as_str());
            line.set_alignment(Alignment::Center);
            let rendered = line.styled(*line_style).render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, rendered.size.height));
        }
        if !self.heading.is_empty() {
            area.add_offset(Position::new(0, HEADING_GAP_MM));
        }

        let available = area.size().height;
        if self.footer_height > available {
            return Err(Error::new(
                "page frame leaves no room for content",
                ErrorKind::PageSizeExceeded,
            ));
        }

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, available - self.footer_height));
        let mut footer = Paragraph::new(format!("Page {}", self.page));
        footer.set_alignment(Alignment::Right);
        footer.render(context, footer_area, style)?;

        area.set_height(available - self.footer_height);
        Ok(area)
    }
}
