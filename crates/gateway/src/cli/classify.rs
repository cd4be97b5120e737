//! `tutorgate classify`: run the gates on a piece of text without a server.

use serde::Serialize;
use tg_domain::config::Config;

use crate::pipeline::classify::{
    CrisisDetector, GeneratedSignal, QualityGate, QualityVerdict, TextClassifier,
};

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub crisis: Option<String>,
    pub quality: &'static str,
    pub reason: Option<String>,
    /// Whether the text would reach the generator.
    pub forwarded: bool,
}

pub fn run(
    config: &Config,
    text: &str,
    exchange_count: u32,
    min_exchanges: u32,
) -> anyhow::Result<ClassifyReport> {
    let crisis = CrisisDetector::new()?.classify(text);
    if let Some(hit) = crisis {
        return Ok(ClassifyReport {
            crisis: Some(hit.category.as_str().to_owned()),
            quality: "skipped",
            reason: None,
            forwarded: false,
        });
    }

    let gate = QualityGate::new(&config.quality)?;
    let report = match gate.evaluate(text, exchange_count, min_exchanges) {
        QualityVerdict::Pass => ClassifyReport {
            crisis: None,
            quality: "pass",
            reason: None,
            forwarded: true,
        },
        QualityVerdict::LowEffort(hit) => ClassifyReport {
            crisis: None,
            quality: "low_effort",
            reason: Some(format!("{} ({})", hit.category.as_str(), hit.matched)),
            forwarded: false,
        },
        QualityVerdict::Generated(hit) => ClassifyReport {
            crisis: None,
            quality: "generated_text",
            reason: Some(match hit.category {
                GeneratedSignal::Fingerprint => format!("fingerprint: {}", hit.matched),
                GeneratedSignal::WeakMarkers(n) => format!("{n} markers: {}", hit.matched),
            }),
            forwarded: false,
        },
    };
    Ok(report)
}

pub fn print(report: &ClassifyReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("crisis:    {}", report.crisis.as_deref().unwrap_or("none"));
    println!("quality:   {}", report.quality);
    if let Some(reason) = &report.reason {
        println!("reason:    {reason}");
    }
    println!("forwarded: {}", if report.forwarded { "yes" } else { "no" });
    Ok(())
}
