//! Page planning for prescription documents.
//!
//! Coordinates are points on an A4 page with the origin at the top left.
//! Text `y` values are baselines.

use crate::config::Letterhead;
use crate::models::{LineItem, Medicine, Patient, Prescription};
use crate::validation::ValidationError;

use super::text::{chars_for_width, fit_line, long_form_date, short_date, wrap_text};
use super::MedicineIndex;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 40.0;
pub const CENTER_X: f32 = 297.0;
pub const RIGHT_X: f32 = PAGE_WIDTH - MARGIN;

/// Most medicines listed on one page.
pub const MAX_ITEMS_PER_PAGE: usize = 8;

/// Where the medicine list starts on a prescription's first page.
pub const OPENING_LIST_Y: f32 = 220.0;
/// Where the medicine list starts on an overflow page.
pub const CONTINUATION_LIST_Y: f32 = 160.0;

const BODY_SIZE: f32 = 12.0;
const LIST_HEADING_GAP: f32 = 20.0;
const LINE_HEIGHT: f32 = 15.0;
const ITEM_GAP: f32 = 5.0;

const OBSERVATIONS_TOP: f32 = PAGE_HEIGHT - 200.0;
/// Lowest baseline an observation line may use without touching the footer.
const OBSERVATIONS_LIMIT: f32 = FOOTER_Y - LINE_HEIGHT;
const OBSERVATIONS_WIDTH: f32 = 500.0;
const OBSERVATIONS_GAP: f32 = 10.0;

const FOOTER_Y: f32 = PAGE_HEIGHT - 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        align: Align,
    },
    Rule {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
    },
}

impl Element {
    fn text(text: impl Into<String>, x: f32, y: f32, size: f32, style: FontStyle) -> Self {
        Element::Text {
            text: text.into(),
            x,
            y,
            size,
            style,
            align: Align::Left,
        }
    }

    fn aligned(text: impl Into<String>, x: f32, y: f32, size: f32, style: FontStyle, align: Align) -> Self {
        Element::Text {
            text: text.into(),
            x,
            y,
            size,
            style,
            align,
        }
    }

    fn rule(from: (f32, f32), to: (f32, f32)) -> Self {
        Element::Rule {
            from,
            to,
            thickness: 1.0,
        }
    }
}

/// Whether a page opens a prescription or continues an overflowing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Opening,
    Continuation,
}

/// Layout of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub prescription_id: String,
    pub kind: PageKind,
    /// Medicines listed on this page
    pub item_count: usize,
    pub elements: Vec<Element>,
}

impl PagePlan {
    /// Text of every text element, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            Element::Text { text, .. } => Some(text.as_str()),
            Element::Rule { .. } => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }
}

/// Layout of a whole document, pages in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub title: String,
    pub pages: Vec<PagePlan>,
}

/// Check that there is something to render and that every prescription
/// belongs to `patient`.
pub fn check_prescriptions(
    prescriptions: &[Prescription],
    patient: &Patient,
) -> Result<(), ValidationError> {
    if prescriptions.is_empty() {
        return Err(ValidationError::NoPrescriptions);
    }
    if let Some(other) = prescriptions.iter().find(|p| p.patient_id != patient.id) {
        return Err(ValidationError::PatientMismatch {
            prescription_id: other.id.clone(),
            expected: patient.id.clone(),
            found: other.patient_id.clone(),
        });
    }
    Ok(())
}

/// Lay out `prescriptions` for `patient`.
///
/// Each prescription opens a new page with the full header and patient block.
/// Its medicines go in chunks of [`MAX_ITEMS_PER_PAGE`]; every further chunk
/// gets its own page with a continuation note instead of the patient block.
/// Line items whose medicine is not in `medicines` are left out.
pub fn plan_document(
    prescriptions: &[Prescription],
    patient: &Patient,
    medicines: &MedicineIndex,
    letterhead: &Letterhead,
) -> Result<DocumentPlan, ValidationError> {
    check_prescriptions(prescriptions, patient)?;

    let mut pages = Vec::new();
    for prescription in prescriptions {
        pages.extend(plan_prescription(prescription, patient, medicines, letterhead));
    }

    Ok(DocumentPlan {
        title: format!("{} - {}", letterhead.title, patient.name),
        pages,
    })
}

fn plan_prescription(
    prescription: &Prescription,
    patient: &Patient,
    medicines: &MedicineIndex,
    letterhead: &Letterhead,
) -> Vec<PagePlan> {
    let resolved: Vec<(&LineItem, &Medicine)> = prescription
        .line_items
        .iter()
        .filter_map(|item| match medicines.get(&item.medicine_id) {
            Some(medicine) => Some((item, medicine)),
            None => {
                tracing::warn!(
                    prescription_id = %prescription.id,
                    medicine_id = %item.medicine_id,
                    "Skipping unknown medicine"
                );
                None
            }
        })
        .collect();

    let chunks: Vec<&[(&LineItem, &Medicine)]> = if resolved.is_empty() {
        vec![resolved.as_slice()]
    } else {
        resolved.chunks(MAX_ITEMS_PER_PAGE).collect()
    };
    let last_chunk = chunks.len() - 1;

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let kind = if index == 0 {
                PageKind::Opening
            } else {
                PageKind::Continuation
            };

            let mut elements = header(letterhead);
            let list_y = match kind {
                PageKind::Opening => {
                    elements.extend(patient_block(patient));
                    OPENING_LIST_Y
                }
                PageKind::Continuation => {
                    elements.push(continuation_note(patient));
                    CONTINUATION_LIST_Y
                }
            };

            let list_end = medicine_list(&mut elements, chunk, index * MAX_ITEMS_PER_PAGE, list_y);
            if index == last_chunk && prescription.has_observations() {
                observations(&mut elements, &prescription.observations, list_end);
            }
            elements.extend(footer(prescription, letterhead));

            PagePlan {
                prescription_id: prescription.id.clone(),
                kind,
                item_count: chunk.len(),
                elements,
            }
        })
        .collect()
}

fn header(letterhead: &Letterhead) -> Vec<Element> {
    let mut elements: Vec<Element> = letterhead
        .organization
        .iter()
        .enumerate()
        .map(|(i, line)| Element::text(line.as_str(), 60.0, 40.0 + 15.0 * i as f32, BODY_SIZE, FontStyle::Bold))
        .collect();

    elements.push(Element::text(
        letterhead.department.as_str(),
        400.0,
        40.0,
        BODY_SIZE,
        FontStyle::Bold,
    ));
    elements.push(Element::aligned(
        letterhead.title.as_str(),
        CENTER_X,
        90.0,
        18.0,
        FontStyle::Bold,
        Align::Center,
    ));
    elements.push(Element::rule((MARGIN, 105.0), (RIGHT_X, 105.0)));
    elements
}

fn patient_block(patient: &Patient) -> Vec<Element> {
    let mut elements = vec![
        Element::text("Paciente:", MARGIN, 130.0, BODY_SIZE, FontStyle::Bold),
        Element::text(
            fit_line(&patient.name, chars_for_width(340.0 - 100.0, BODY_SIZE)),
            100.0,
            130.0,
            BODY_SIZE,
            FontStyle::Regular,
        ),
    ];

    if let Some(birth_date) = patient.birth_date {
        elements.push(Element::text(
            "Data de Nascimento:",
            350.0,
            130.0,
            BODY_SIZE,
            FontStyle::Bold,
        ));
        elements.push(Element::text(
            short_date(birth_date),
            480.0,
            130.0,
            BODY_SIZE,
            FontStyle::Regular,
        ));
    }

    if let Some(national_id) = patient.display_national_id() {
        elements.push(Element::text("CPF/RG:", MARGIN, 150.0, BODY_SIZE, FontStyle::Bold));
        elements.push(Element::text(national_id, 100.0, 150.0, BODY_SIZE, FontStyle::Regular));
    }

    elements
}

const CONTINUATION_NOTE_SIZE: f32 = 10.0;

fn continuation_note(patient: &Patient) -> Element {
    let note = format!("Continuação da receita - Paciente: {}", patient.name);
    Element::text(
        fit_line(&note, chars_for_width(RIGHT_X - MARGIN, CONTINUATION_NOTE_SIZE)),
        MARGIN,
        120.0,
        CONTINUATION_NOTE_SIZE,
        FontStyle::Italic,
    )
}

/// Emit the list heading and items. Numbering starts after `numbered_before`.
/// Returns the cursor below the last item.
fn medicine_list(
    elements: &mut Vec<Element>,
    chunk: &[(&LineItem, &Medicine)],
    numbered_before: usize,
    start_y: f32,
) -> f32 {
    let max_chars = chars_for_width(RIGHT_X - MARGIN, BODY_SIZE);
    let mut y = start_y;

    elements.push(Element::text("Medicamentos:", MARGIN, y, BODY_SIZE, FontStyle::Bold));
    y += LIST_HEADING_GAP;

    for (i, (item, medicine)) in chunk.iter().enumerate() {
        let line = format!("{}. {}", numbered_before + i + 1, medicine.description());
        elements.push(Element::text(fit_line(&line, max_chars), MARGIN, y, BODY_SIZE, FontStyle::Regular));
        y += LINE_HEIGHT;

        if item.has_dosing() {
            let dosing = format!("   Posologia: {}", item.dosing.trim());
            elements.push(Element::text(fit_line(&dosing, max_chars), MARGIN, y, BODY_SIZE, FontStyle::Regular));
            y += LINE_HEIGHT;
        }

        y += ITEM_GAP;
    }

    y
}

/// Observations sit at a fixed height above the footer. Long text moves the
/// block up, never above the medicine list; what still does not fit is cut.
fn observations(elements: &mut Vec<Element>, text: &str, list_end: f32) {
    let mut lines = wrap_text(text, chars_for_width(OBSERVATIONS_WIDTH, BODY_SIZE));
    if lines.is_empty() {
        return;
    }

    let block_height = LINE_HEIGHT * lines.len() as f32;
    let top = OBSERVATIONS_TOP
        .min(OBSERVATIONS_LIMIT - block_height)
        .max(list_end + OBSERVATIONS_GAP);

    let room = ((OBSERVATIONS_LIMIT - top) / LINE_HEIGHT).floor().max(1.0) as usize;
    if lines.len() > room {
        lines.truncate(room);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }

    elements.push(Element::text("Observações Gerais:", MARGIN, top, BODY_SIZE, FontStyle::Bold));
    for (i, line) in lines.into_iter().enumerate() {
        let y = top + LINE_HEIGHT * (i + 1) as f32;
        elements.push(Element::text(line, MARGIN, y, BODY_SIZE, FontStyle::Regular));
    }
}

fn footer(prescription: &Prescription, letterhead: &Letterhead) -> Vec<Element> {
    let signature_y = FOOTER_Y + 30.0;
    vec![
        Element::aligned(
            long_form_date(&letterhead.city, prescription.date),
            RIGHT_X,
            FOOTER_Y,
            BODY_SIZE,
            FontStyle::Regular,
            Align::Right,
        ),
        Element::rule((200.0, signature_y), (400.0, signature_y)),
        Element::aligned(
            letterhead.signature_label.as_str(),
            300.0,
            signature_y + 15.0,
            11.0,
            FontStyle::Regular,
            Align::Center,
        ),
        Element::aligned(
            letterhead.address_line.as_str(),
            CENTER_X,
            signature_y + 45.0,
            9.0,
            FontStyle::Regular,
            Align::Center,
        ),
    ]
}
