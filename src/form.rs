use crate::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The inputs of the clearing instruction form, in the order they appear on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CompanyName,
    CompanyRegNo,
    VatNo,
    ContactPerson,
    TelephoneNo,
    Email,
    Vessel,
    BillNo,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::CompanyName,
        Field::CompanyRegNo,
        Field::VatNo,
        Field::ContactPerson,
        Field::TelephoneNo,
        Field::Email,
        Field::Vessel,
        Field::BillNo,
    ];

    /// Fields that must be filled in before the rasterized export runs.
    pub const REQUIRED_AT_SUBMIT: [Field; 3] = [Field::CompanyName, Field::Email, Field::Vessel];

    /// Input name, as used by the change handler and the rendered markup.
    pub fn name(self) -> &'static str {
        match self {
            Field::CompanyName => "companyName",
            Field::CompanyRegNo => "companyRegNo",
            Field::VatNo => "vatNo",
            Field::ContactPerson => "contactPerson",
            Field::TelephoneNo => "telephoneNo",
            Field::Email => "email",
            Field::Vessel => "vessel",
            Field::BillNo => "billNo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::CompanyName => "Company Name",
            Field::CompanyRegNo => "Company Reg No",
            Field::VatNo => "VAT No",
            Field::ContactPerson => "Contact Person",
            Field::TelephoneNo => "Telephone No",
            Field::Email => "Email",
            Field::Vessel => "Vessel",
            Field::BillNo => "Bill No",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Field::CompanyName => "Enter company name",
            Field::CompanyRegNo => "Enter company registration number",
            Field::VatNo => "Enter VAT number",
            Field::ContactPerson => "Enter contact person",
            Field::TelephoneNo => "Enter telephone number",
            Field::Email => "Enter email address",
            Field::Vessel => "Enter vessel name",
            Field::BillNo => "Enter bill number",
        }
    }

    pub fn input_type(self) -> &'static str {
        match self {
            Field::Email => "email",
            _ => "text",
        }
    }

    /// Carries the `required` attribute in the rendered form.
    pub fn is_marked_required(self) -> bool {
        matches!(
            self,
            Field::CompanyName | Field::CompanyRegNo | Field::Email | Field::Vessel
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == name)
            .ok_or_else(|| Error::UnknownField(name.to_owned()))
    }
}

/// Values typed into the form. Every field is free text and starts out empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub company_name: String,
    pub company_reg_no: String,
    pub vat_no: String,
    pub contact_person: String,
    pub telephone_no: String,
    pub email: String,
    pub vessel: String,
    pub bill_no: String,
}

impl FormData {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::CompanyName => &self.company_name,
            Field::CompanyRegNo => &self.company_reg_no,
            Field::VatNo => &self.vat_no,
            Field::ContactPerson => &self.contact_person,
            Field::TelephoneNo => &self.telephone_no,
            Field::Email => &self.email,
            Field::Vessel => &self.vessel,
            Field::BillNo => &self.bill_no,
        }
    }

    /// Returns a new record with `field` replaced, leaving `self` untouched.
    pub fn with(&self, field: Field, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            Field::CompanyName => next.company_name = value,
            Field::CompanyRegNo => next.company_reg_no = value,
            Field::VatNo => next.vat_no = value,
            Field::ContactPerson => next.contact_person = value,
            Field::TelephoneNo => next.telephone_no = value,
            Field::Email => next.email = value,
            Field::Vessel => next.vessel = value,
            Field::BillNo => next.bill_no = value,
        }
        next
    }

    /// Field values in declared order.
    pub fn entries(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL.iter().map(move |field| (*field, self.get(*field)))
    }

    pub fn missing_required(&self) -> Vec<Field> {
        Field::REQUIRED_AT_SUBMIT
            .iter()
            .copied()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }

    /// Presence check for the fields required at submit.
    pub fn validate(&self) -> Result<(), Error> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequiredFields(missing))
        }
    }
}
