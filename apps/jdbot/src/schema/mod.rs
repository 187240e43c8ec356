//! The fixed, ordered set of recruiting fields a job description should cover.

use serde::Serialize;

/// One category and its expected fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategorySchema {
    #[serde(rename = "category")]
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

const RECRUITING_FIELDS: &[CategorySchema] = &[
    CategorySchema {
        name: "Customer Details",
        fields: &["Customer", "Hiring Manager"],
    },
    CategorySchema {
        name: "Position Details",
        fields: &[
            "Engagement Type",
            "Position Status",
            "Date of Qualification",
            "Position Open Date",
            "Number of Positions",
            "Account Manager/Lead",
            "Target Fulfillment Date",
            "Grade/Bands/Levels/Competency",
            "Education",
            "CTC Range",
            "Type of Position",
        ],
    },
    CategorySchema {
        name: "Technical Skills",
        fields: &["Mandatory in Years", "Good to Have"],
    },
    CategorySchema {
        name: "Business Unit",
        fields: &[
            "Type of work they do",
            "Team Size",
            "Organization Structure",
            "In house/Customer project",
            "Composition of people in the current team",
        ],
    },
    CategorySchema {
        name: "Roles & Responsibilities",
        fields: &[
            "Cultural Expectations",
            "Key Roles",
            "Key Responsibilities",
            "Current roles",
            "Reports to",
            "Non-technical skills",
            "Screening Questions",
            "Consultant Note Questions",
        ],
    },
    CategorySchema {
        name: "Other Details",
        fields: &[
            "Preferred Location",
            "Target Date of Offer",
            "Date of requalification",
            "Interview Process",
            "Panel Availability",
            "Office Location",
            "Work Timings",
            "Notice Period",
            "Travel Needs",
            "Acceptable Job Changes",
            "Customer Value Proposition",
        ],
    },
];

/// Immutable category → fields mapping. Copy is cheap: it only borrows static data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    categories: &'static [CategorySchema],
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::recruiting()
    }
}

impl FieldSchema {
    /// The recruiting schema every job description is checked against.
    pub const fn recruiting() -> Self {
        Self {
            categories: RECRUITING_FIELDS,
        }
    }

    pub fn categories(&self) -> &'static [CategorySchema] {
        self.categories
    }

    pub fn all_categories(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.name).collect()
    }

    /// Fields expected in `category`, in registry order. Unknown categories have none.
    pub fn fields_for(&self, category: &str) -> &'static [&'static str] {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.fields)
            .unwrap_or(&[])
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.name == category)
    }

    pub fn contains(&self, category: &str, field: &str) -> bool {
        self.fields_for(category).contains(&field)
    }

    pub fn field_count(&self) -> usize {
        self.categories.iter().map(|c| c.fields.len()).sum()
    }

    /// Human-readable listing embedded in the extraction prompt:
    /// numbered categories, one bullet per field.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, category) in self.categories.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("{}. {}:\n", i + 1, category.name));
            for field in category.fields {
                out.push_str(&format!("   - {field}\n"));
            }
        }
        out
    }
}
