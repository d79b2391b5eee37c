//! Built-in King's Hospital menu

use super::{CasePolicy, DocumentTransfer, Menu, Reply};
use crate::Result;

/// MIME type declared for documents unless overridden
pub const DEFAULT_DOCUMENT_MIME: &str = "application/pdf";

const ROOT_MENU: &str = "Welcome to King's Hospital. Please select a service:\n\
    1. Book a Doctor\n\
    2. Home Lab Request\n\
    3. Ambulance Service\n\
    4. Other Hospital Services";

const DEPARTMENTS_MENU: &str = "Please select from the following:\n\
    A. Wellness Center\n\
    B. Radiology\n\
    C. Surgical Care\n\
    D. Physiotherapy Unit\n\
    E. Laboratory Services\n\
    F. Endoscopy Unit\n\
    G. Wound Clinic\n\
    H. Gynecology & Obstetrics\n\
    I. 24 Hours Pharmacy";

/// Build the King's Hospital menu
///
/// Greetings open the root menu, `1`-`3` answer with a contact number, `4`
/// lists the departments and sends `document`, and `A`-`I` answer with a
/// department number (or the shared support line when a department has
/// none of its own).
///
/// # Errors
///
/// Never fails in practice; the table is validated like any other menu.
pub fn kings_hospital(document: DocumentTransfer) -> Result<Menu> {
    Menu::builder(CasePolicy::Upper)
        .text(["HI", "HELLO", "HEY"], ROOT_MENU)
        .text(
            ["1"],
            "Contact the following number to book an appointment: 94117743743",
        )
        .text(
            ["2"],
            "Contact the following number to place a homelab request: 9876543212",
        )
        .text(
            ["3"],
            "Contact the following number to request ambulance service: 9876543515",
        )
        .entry(
            ["4"],
            Reply::TextWithDocument {
                text: DEPARTMENTS_MENU.to_string(),
                document,
            },
        )
        .text(["A"], "Contact this number for Wellness Center: 044-121345")
        .text(["B"], "Contact this number for Radiology: 044-121346")
        .text(["C"], "Contact this number for Surgical Care: 044-121347")
        .text(["D"], "Contact this number for Physiotherapy Unit: 044-121348")
        .text(["I"], "Contact this number for 24 Hours Pharmacy: 044-121349")
        .text(
            ["E", "F", "G", "H"],
            "Contact this number for customer support: 044-121345",
        )
        .fallback("Please choose from the given options")
        .build()
}
