//! HTML report rendering.
//!
//! A report is a self-contained HTML document rebuilt from either the
//! session's last outcome (fresh upload, full detail) or an archived
//! diagnosis row (no confidence, no image artifacts).

use serde::{Deserialize, Serialize};

use crate::models::{Diagnosis, DiagnosisOutcome, Patient};

/// Everything a report view needs, already formatted for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    pub patient_name: String,
    pub patient_id: String,
    pub gender: String,
    pub date_of_birth: String,
    pub scan_time: String,
    pub result: String,
    /// Confidence percentage; absent for archived diagnoses.
    pub confidence_percent: Option<f64>,
    /// Served path of the original scan, when available.
    pub image_url: Option<String>,
    /// Served path of the heatmap overlay, when available.
    pub heatmap_url: Option<String>,
}

impl ReportContext {
    /// Full-detail context from the session's last outcome.
    pub fn from_outcome(outcome: &DiagnosisOutcome) -> Self {
        Self {
            patient_name: outcome.patient_name.clone(),
            patient_id: outcome.patient_id.clone(),
            gender: outcome.gender.clone(),
            date_of_birth: outcome.date_of_birth.to_string(),
            scan_time: outcome.scan_time.clone(),
            result: outcome.label.as_str().to_string(),
            confidence_percent: Some(outcome.confidence_percent),
            image_url: Some(format!("/uploads/{}", outcome.image_name)),
            heatmap_url: outcome
                .heatmap_name
                .as_ref()
                .map(|name| format!("/uploads/{name}")),
        }
    }

    /// Archive context from a diagnosis row. Image artifacts and
    /// confidence were never persisted, so those fields stay empty.
    pub fn from_record(record: &Diagnosis, patient: Option<&Patient>) -> Self {
        Self {
            patient_name: record.patient_name.clone(),
            patient_id: record.patient_id.clone(),
            gender: patient.map(|p| p.gender.clone()).unwrap_or_default(),
            date_of_birth: patient
                .map(|p| p.date_of_birth.to_string())
                .unwrap_or_default(),
            scan_time: record.scan_date.to_string(),
            result: record.result.clone().unwrap_or_default(),
            confidence_percent: None,
            image_url: None,
            heatmap_url: None,
        }
    }
}

/// Attachment filename for a downloaded report.
pub fn download_filename(patient_id: &str, diagnosis_id: i64) -> String {
    format!("DeepSight_Report_{patient_id}_{diagnosis_id}.html")
}

/// Render a report context as a standalone HTML document.
pub fn render_html(ctx: &ReportContext) -> String {
    let confidence = ctx
        .confidence_percent
        .map(|c| format!("{c:.2}%"))
        .unwrap_or_else(|| "\u{2014}".to_string());

    let images = [
        ("OCT scan", ctx.image_url.as_deref()),
        ("Activation heatmap", ctx.heatmap_url.as_deref()),
    ]
    .into_iter()
    .filter_map(|(title, url)| {
        url.map(|u| {
            format!(
                "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
                escape_html(u),
                escape_html(title),
                escape_html(title),
            )
        })
    })
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>DeepSight Report</title>\n</head>\n<body>\n\
         <h1>DeepSight Diagnosis Report</h1>\n\
         <table>\n\
         <tr><th>Patient</th><td>{patient_name}</td></tr>\n\
         <tr><th>Patient ID</th><td>{patient_id}</td></tr>\n\
         <tr><th>Gender</th><td>{gender}</td></tr>\n\
         <tr><th>Date of birth</th><td>{dob}</td></tr>\n\
         <tr><th>Scan time</th><td>{scan_time}</td></tr>\n\
         <tr><th>Result</th><td>{result}</td></tr>\n\
         <tr><th>Confidence</th><td>{confidence}</td></tr>\n\
         </table>\n{images}\n</body>\n</html>\n",
        patient_name = escape_html(&ctx.patient_name),
        patient_id = escape_html(&ctx.patient_id),
        gender = escape_html(&ctx.gender),
        dob = escape_html(&ctx.date_of_birth),
        scan_time = escape_html(&ctx.scan_time),
        result = escape_html(&ctx.result),
        confidence = escape_html(&confidence),
        images = images,
    )
}

fn escape_html(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            other => other.to_string(),
        })
        .collect()
}
