//! PDF emission of a document plan.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
};

use super::layout::{Align, DocumentPlan, Element, FontStyle, PAGE_HEIGHT, PAGE_WIDTH};
use super::text::text_width;
use super::{RenderError, RenderResult};

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Layout y runs down from the top edge; PDF y runs up from the bottom.
fn flip(y: f32) -> Mm {
    mm(PAGE_HEIGHT - y)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

/// Emit `plan` as PDF bytes.
pub(super) fn emit(plan: &DocumentPlan) -> RenderResult<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        plan.title.as_str(),
        mm(PAGE_WIDTH),
        mm(PAGE_HEIGHT),
        "Layer 1",
    );

    let font = |builtin| {
        doc.add_builtin_font(builtin)
            .map_err(|e| RenderError::Font(e.to_string()))
    };
    let fonts = Fonts {
        regular: font(BuiltinFont::Helvetica)?,
        bold: font(BuiltinFont::HelveticaBold)?,
        italic: font(BuiltinFont::HelveticaOblique)?,
    };

    for (index, page) in plan.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), format!("Page {} Layer 1", index + 1))
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for element in &page.elements {
            draw(&layer, element, &fonts);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| RenderError::Save(e.to_string()))
}

fn draw(layer: &PdfLayerReference, element: &Element, fonts: &Fonts) {
    match element {
        Element::Text {
            text,
            x,
            y,
            size,
            style,
            align,
        } => {
            let x = match align {
                Align::Left => *x,
                Align::Center => x - text_width(text, *size) / 2.0,
                Align::Right => x - text_width(text, *size),
            };
            layer.use_text(text.as_str(), *size, mm(x), flip(*y), fonts.get(*style));
        }
        Element::Rule {
            from,
            to,
            thickness,
        } => {
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(from.0), flip(from.1)), false),
                    (Point::new(mm(to.0), flip(to.1)), false),
                ],
                is_closed: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert!((mm(72.0).0 - 25.4).abs() < 1e-4);
        assert!((flip(PAGE_HEIGHT).0).abs() < 1e-4);
        assert!((flip(0.0).0 - 297.0).abs() < 0.1);
    }
}
