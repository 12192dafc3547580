//! kanban view command implementation.
//!
//! History lives only as long as the process, so `view` reads every id it
//! is given and then reports what the bounded history kept.

use std::collections::HashSet;

use serde::Serialize;

use crate::cli::StoreOptions;
use crate::error::Result;
use crate::issue::{Item, ItemId};
use crate::output::{emit_success, item_line, HumanOutput, OutputOptions};

pub struct ViewOptions {
    pub ids: Vec<ItemId>,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct ViewReport {
    viewed: Vec<Item>,
    limit: usize,
    history: Vec<Item>,
}

pub fn run(options: ViewOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let viewed = options
        .ids
        .iter()
        .map(|id| manager.get_item(*id))
        .collect::<Result<Vec<_>>>()?;
    let limit = manager.manager().history_cache().limit();
    let history = manager.history();

    let mut human = HumanOutput::new("View history (oldest first)");
    human.push_summary("Viewed", viewed.len().to_string());
    human.push_summary("Remembered", format!("{} of {limit}", history.len()));
    for item in &history {
        human.push_detail(item_line(item));
    }
    let distinct: HashSet<ItemId> = options.ids.iter().copied().collect();
    if distinct.len() > limit {
        human.push_warning(format!(
            "{} distinct items viewed; only the last {limit} are remembered",
            distinct.len()
        ));
    }

    let report = ViewReport {
        viewed,
        limit,
        history,
    };
    emit_success(options.output, "view", &report, Some(&human))
}
