//! Markdown dashboard generation.
//!
//! Renders a published frame as the textual dashboard: the full response
//! table plus one section per aggregate. The JSON variant serializes the
//! frame as-is for machine consumers.

use crate::config::ReportConfig;
use crate::models::{Aggregate, AnswerOption, DashboardFrame, QuestionTally};
use anyhow::Result;

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(frame: &DashboardFrame, options: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Sondeo Dashboard\n\n");
    output.push_str(&generate_metadata_section(frame));

    if frame.responses.is_empty() {
        output.push_str("No hay respuestas registradas todavía.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    if options.include_responses {
        output.push_str(&generate_responses_section(frame, options.max_table_rows));
    }

    output.push_str(&generate_aggregate_section(
        "Usuarios por División",
        "División",
        "Usuarios",
        &frame.aggregates.division,
    ));
    output.push_str(&generate_age_section(&frame.aggregates.age));
    output.push_str(&generate_aggregate_section(
        "Distribución por Género",
        "Género",
        "Cantidad",
        &frame.aggregates.gender,
    ));
    output.push_str(&generate_aggregate_section(
        "Análisis de Sentimientos",
        "Sentimiento",
        "Cantidad",
        &frame.aggregates.sentiment,
    ));
    output.push_str(&generate_questions_section(&frame.aggregates.questions));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(frame: &DashboardFrame) -> String {
    let mut section = String::new();

    section.push_str("## Resumen\n\n");
    section.push_str(&format!(
        "- **Generado:** {}\n",
        frame.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Snapshot:** #{}\n", frame.seq));
    section.push_str(&format!(
        "- **Respuestas:** {}\n\n",
        frame.respondent_count()
    ));

    section
}

/// Generate the full responses table.
fn generate_responses_section(frame: &DashboardFrame, max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Datos Completos\n\n");

    let with_date = frame.responses.iter().any(|r| r.submitted_at.is_some());
    if with_date {
        section.push_str("| # | Nombre | Edad | División | Género | Sentimiento | Fecha |\n");
        section.push_str("|:---:|:---|:---:|:---|:---|:---|:---|\n");
    } else {
        section.push_str("| # | Nombre | Edad | División | Género | Sentimiento |\n");
        section.push_str("|:---:|:---|:---:|:---|:---|:---|\n");
    }

    for response in frame.responses.iter().take(max_rows) {
        if with_date {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                response.id,
                response.name,
                response.age_label(),
                response.division,
                response.gender,
                response.sentiment,
                response.submitted_at.as_deref().unwrap_or("-"),
            ));
        } else {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                response.id,
                response.name,
                response.age_label(),
                response.division,
                response.gender,
                response.sentiment,
            ));
        }
    }

    if frame.responses.len() > max_rows {
        section.push_str(&format!(
            "\n*{} respuestas más omitidas.*\n",
            frame.responses.len() - max_rows
        ));
    }
    section.push('\n');

    section
}

/// Generate one aggregate table section.
fn generate_aggregate_section(
    title: &str,
    label_header: &str,
    count_header: &str,
    aggregate: &Aggregate,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!(
        "| {} | {} | Porcentaje |\n",
        label_header, count_header
    ));
    section.push_str("|:---|:---:|:---:|\n");

    for bucket in &aggregate.buckets {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            bucket.label, bucket.count, bucket.percentage
        ));
    }
    section.push('\n');

    section
}

/// Generate the age distribution section. Buckets are labeled in years and
/// only the 18-35 window is counted.
fn generate_age_section(aggregate: &Aggregate) -> String {
    let mut section = String::new();

    section.push_str("## Distribución por Edad\n\n");
    if aggregate.buckets.is_empty() {
        section.push_str("Sin respuestas dentro del rango de 18 a 35 años.\n\n");
        return section;
    }

    section.push_str("| Edad | Cantidad | Porcentaje |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for bucket in &aggregate.buckets {
        section.push_str(&format!(
            "| {} años | {} | {:.1}% |\n",
            bucket.label, bucket.count, bucket.percentage
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-question tally section.
fn generate_questions_section(tallies: &[QuestionTally]) -> String {
    let mut section = String::new();

    section.push_str("## Respuestas por Pregunta\n\n");
    section.push_str("| Pregunta | Opción A | Opción B | Opción C |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for tally in tallies {
        section.push_str(&format!(
            "| Pregunta {} | {} ({:.1}%) | {} ({:.1}%) | {} ({:.1}%) |\n",
            tally.question,
            tally.a,
            tally.share(AnswerOption::A),
            tally.b,
            tally.share(AnswerOption::B),
            tally.c,
            tally.share(AnswerOption::C),
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Reporte generado por Sondeo*\n");

    footer
}

/// Generate a JSON report of the whole frame.
pub fn generate_json_report(frame: &DashboardFrame) -> Result<String> {
    serde_json::to_string_pretty(frame).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::models::Snapshot;

    fn frame_from_json(json: &str) -> DashboardFrame {
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        engine::analyze(1, &snapshot)
    }

    fn sample_frame() -> DashboardFrame {
        frame_from_json(
            r#"{
                "-Na": {"respuestas": {"nombre": "Ana", "edad": "22", "carrera": "TIC", "genero": "Femenino",
                    "pregunta1": "a", "pregunta2": "a", "pregunta3": "a", "pregunta4": "a", "pregunta5": "a",
                    "pregunta6": "a", "pregunta7": "a", "pregunta8": "a", "pregunta9": "a", "pregunta10": "a"},
                    "fecha": "15/3/2025, 10:12:03"},
                "-Nb": {"respuestas": {"nombre": "Luis", "edad": "24", "carrera": "Mecatrónica", "genero": "Masculino",
                    "pregunta1": "b", "pregunta2": "b", "pregunta3": "b", "pregunta4": "b", "pregunta5": "b",
                    "pregunta6": "b", "pregunta7": "b", "pregunta8": "b", "pregunta9": "b", "pregunta10": "b"}}
            }"#,
        )
    }

    #[test]
    fn test_generate_markdown_report() {
        let frame = sample_frame();
        let markdown = generate_markdown_report(&frame, &ReportConfig::default());

        assert!(markdown.contains("# Sondeo Dashboard"));
        assert!(markdown.contains("## Datos Completos"));
        assert!(markdown.contains("## Usuarios por División"));
        assert!(markdown.contains("## Análisis de Sentimientos"));
        assert!(markdown.contains("| Ana |"));
        assert!(markdown.contains("Positivo"));
        assert!(markdown.contains("| TIC | 1 | 50.0% |"));
        assert!(markdown.contains("| 22 años | 1 | 50.0% |"));
        assert!(markdown.contains("15/3/2025, 10:12:03"));
    }

    #[test]
    fn test_markdown_report_empty_frame() {
        let frame = frame_from_json("{}");
        let markdown = generate_markdown_report(&frame, &ReportConfig::default());
        assert!(markdown.contains("No hay respuestas registradas todavía."));
        assert!(!markdown.contains("## Datos Completos"));
    }

    #[test]
    fn test_responses_table_truncation() {
        let frame = sample_frame();
        let options = ReportConfig {
            max_table_rows: 1,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&frame, &options);
        assert!(markdown.contains("| Ana |"));
        assert!(!markdown.contains("| Luis |"));
        assert!(markdown.contains("1 respuestas más omitidas."));
    }

    #[test]
    fn test_responses_table_can_be_disabled() {
        let frame = sample_frame();
        let options = ReportConfig {
            include_responses: false,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&frame, &options);
        assert!(!markdown.contains("## Datos Completos"));
        assert!(markdown.contains("## Usuarios por División"));
    }

    #[test]
    fn test_generate_json_report() {
        let frame = sample_frame();
        let json = generate_json_report(&frame).unwrap();
        assert!(json.contains("\"responses\""));
        assert!(json.contains("\"aggregates\""));
        assert!(json.contains("\"charts\""));
        assert!(json.contains("\"Positivo\""));
    }

    #[test]
    fn test_questions_section_shares() {
        let frame = sample_frame();
        let markdown = generate_markdown_report(&frame, &ReportConfig::default());
        assert!(markdown.contains("| Pregunta 1 | 1 (50.0%) | 1 (50.0%) | 0 (0.0%) |"));
    }
}
