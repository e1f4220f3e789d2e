//! Table of Contents Demo
//!
//! Mounts a scrollspy over a long article, scrolls through it and prints the
//! navigation markup after every step.
//!
//! Run with: cargo run -p spyglass_layout --example table_of_contents

use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use spyglass_layout::prelude::*;

const SECTIONS: &[(&str, &str, f32)] = &[
    ("getting-started", "Getting started", 900.0),
    ("configuration", "Configuration", 1400.0),
    ("scrolling", "Scrolling", 1100.0),
    ("rendering", "Rendering", 800.0),
    ("faq", "FAQ", 250.0),
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spyglass_runtime=debug".parse()?),
        )
        .init();

    let doc = Document::new(1024.0, 768.0);
    for (id, _, height) in SECTIONS {
        doc.append(&RootSelector::Document, *id, *height)
            .context("document root missing")?;
    }

    let config = SpyConfig::new("is-current")
        .with_items(SECTIONS.iter().map(|(id, _, _)| *id))
        .with_scrolled_past_class("is-past")
        .with_class_name("toc")
        .with_style("position", "sticky")
        .with_offset(-40.0);

    let spy = Scrollspy::mount(doc.clone(), config, Rc::new(SystemClock::new()))?;
    spy.on_change(|state| {
        tracing::info!(current = ?state.current_index(), "table of contents updated");
    });

    let children: Vec<_> = SECTIONS
        .iter()
        .map(|(id, title, _)| {
            Some(
                ChildDescriptor::new("li")
                    .with_attribute("data-target", *id)
                    .with_text(*title),
            )
        })
        .collect();

    let mut offset = 0.0;
    while offset < 4_500.0 {
        doc.scroll_to(&RootSelector::Document, offset);
        wait_for_scan(&spy)?;
        println!("scroll {:>6.0}: {}", offset, spy.render(&children).to_markup());
        offset += 600.0;
    }

    spy.unmount();
    Ok(())
}

/// Sleep until pending scans have run
fn wait_for_scan(spy: &Scrollspy<Document>) -> Result<()> {
    while spy.next_deadline().is_some() {
        thread::sleep(Duration::from_millis(20));
        spy.tick()?;
    }
    Ok(())
}
