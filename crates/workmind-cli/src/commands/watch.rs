use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::time::Duration;

use workmind_client::{DocumentStatus, KnowledgeBase, ProgressEvent};

use super::Context;

pub async fn run(ctx: &Context, knowledge_id: &str) -> Result<()> {
    let workspace_id = ctx.workspace_id()?;
    let api = ctx.api()?;
    let interval = Duration::from_millis(ctx.config.client.poll_interval_ms);

    let mut subscription = api.watch_knowledge(&workspace_id, knowledge_id, interval);

    let multi = MultiProgress::new();
    let style = ProgressStyle::default_bar()
        .template("{msg:30} [{bar:30.cyan/blue}] {pos:>3}%")?
        .progress_chars("=>-");
    let mut bars: HashMap<String, ProgressBar> = HashMap::new();

    while subscription.changed().await {
        if let Some(kb) = subscription.latest() {
            render(&kb, &multi, &style, &mut bars);
        }
    }
    subscription.finished().await;

    for bar in bars.values() {
        if !bar.is_finished() {
            bar.abandon();
        }
    }
    if let Some(kb) = subscription.latest() {
        let failed = kb
            .documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Failed)
            .count();
        println!(
            "{}: {} documents, {failed} failed",
            kb.name,
            kb.documents.len()
        );
    }

    Ok(())
}

/// Follows one document's server-sent progress events.
pub async fn document(ctx: &Context, document_id: &str) -> Result<()> {
    let workspace_id = ctx.workspace_id()?;
    let api = ctx.api()?;
    let mut subscription = api.watch_document_progress(&workspace_id, document_id);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:30} [{bar:30.cyan/blue}] {pos:>3}%")?
            .progress_chars("=>-"),
    );
    bar.set_message(document_id.to_string());

    while subscription.changed().await {
        if let Some(event) = subscription.latest() {
            show(&bar, &event);
        }
    }
    subscription.finished().await;

    match subscription.latest() {
        Some(event) if event.status == DocumentStatus::Failed => {
            bail!(
                "{document_id} failed: {}",
                event.message.as_deref().unwrap_or("no reason given")
            )
        }
        Some(event) if event.status == DocumentStatus::Indexed => Ok(()),
        _ => {
            bar.abandon_with_message(format!("{document_id} stream closed"));
            Ok(())
        }
    }
}

fn show(bar: &ProgressBar, event: &ProgressEvent) {
    let label = event
        .message
        .clone()
        .unwrap_or_else(|| event.document_id.clone());
    match event.status {
        DocumentStatus::Indexed => bar.finish_with_message(format!("{label} (indexed)")),
        DocumentStatus::Failed => bar.abandon_with_message(format!("{label} (failed)")),
        DocumentStatus::Pending | DocumentStatus::Processing => {
            if let Some(pos) = event.percent() {
                bar.set_position(pos);
            }
            bar.set_message(label);
        }
    }
}

fn render(
    kb: &KnowledgeBase,
    multi: &MultiProgress,
    style: &ProgressStyle,
    bars: &mut HashMap<String, ProgressBar>,
) {
    for doc in &kb.documents {
        let bar = bars.entry(doc.id.clone()).or_insert_with(|| {
            let bar = multi.add(ProgressBar::new(100));
            bar.set_style(style.clone());
            bar.set_message(doc.file_name.clone());
            bar
        });
        match doc.status {
            DocumentStatus::Indexed => bar.finish_with_message(format!("{} indexed", doc.file_name)),
            DocumentStatus::Failed => bar.abandon_with_message(format!("{} failed", doc.file_name)),
            DocumentStatus::Pending | DocumentStatus::Processing => {
                bar.set_position(doc.progress_percent())
            }
        }
    }
}
