use echoscope_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line(format!("request_id  : {}", envelope.meta.request_id));
    line(format!("generated_at: {}", envelope.meta.generated_at));
    line(format!(
        "sources     : {}",
        envelope
            .meta
            .sources
            .iter()
            .map(|source| source.as_str())
            .collect::<Vec<_>>()
            .join(",")
    ));
    line(format!("latency_ms  : {}", envelope.meta.latency_ms));

    if let Some(score) = envelope.data.get("score").and_then(Value::as_f64) {
        let label = envelope.data.get("label").and_then(Value::as_str).unwrap_or("-");
        let observations = envelope
            .data
            .get("observations")
            .and_then(Value::as_u64)
            .unwrap_or_default();

        line(String::new());
        line(format!("Indicator Score   : {score:.4}"));
        line(format!("Collapse Phase    : {label}"));
        line(format!("Temporal Echo Age : {observations}"));

        if let Some(members) = envelope.data.get("reference_members").and_then(Value::as_array) {
            let labels = members
                .iter()
                .filter_map(|member| member.get("label").and_then(Value::as_str))
                .collect::<Vec<_>>();
            line(format!("Reference Members : {}", labels.join(", ")));
        }
    } else if !envelope.data.is_null() {
        line("data:".to_owned());
        for data_line in serde_json::to_string_pretty(&envelope.data)?.lines() {
            line(format!("  {data_line}"));
        }
    }

    if !envelope.meta.warnings.is_empty() {
        line("warnings:".to_owned());
        for warning in &envelope.meta.warnings {
            line(format!("  - {warning}"));
        }
    }

    if !envelope.errors.is_empty() {
        line("errors:".to_owned());
        for error in &envelope.errors {
            line(format!("  - {}: {}", error.code, error.message));
        }
    }

    Ok(out)
}
