//! Terminal output and prompts for the `oci-sweep` binary

use crate::teardown::{Confirmer, Discovered, FinalizeOutcome, TeardownOutcome, TeardownReport};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use std::io::{BufRead, Write};

/// Sample resources shown per kind by default
pub const DEFAULT_SAMPLES: usize = 10;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(Cell::new).collect::<Vec<_>>());
    table
}

/// Kinds with counts, plus up to `samples` resources of each
pub fn discovery_table(discovered: &Discovered, samples: usize) -> Table {
    let mut table = new_table(&["Kind", "Count", "ID", "Name", "Region", "State"]);

    for (kind, resources) in discovered.iter() {
        for (i, resource) in resources.iter().take(samples.max(1)).enumerate() {
            let (kind_cell, count_cell) = if i == 0 {
                (kind.to_string(), resources.len().to_string())
            } else {
                (String::new(), String::new())
            };
            table.add_row(vec![
                Cell::new(kind_cell),
                Cell::new(count_cell),
                Cell::new(&resource.id),
                Cell::new(&resource.display_name),
                Cell::new(&resource.region),
                Cell::new(resource.lifecycle_state.as_deref().unwrap_or("-")),
            ]);
        }
        if resources.len() > samples.max(1) {
            table.add_row(vec![
                Cell::new(""),
                Cell::new(""),
                Cell::new(format!("... {} more", resources.len() - samples.max(1))),
            ]);
        }
    }
    table
}

/// Kinds in the order they will be deleted
pub fn plan_table(plan: &[(String, usize)]) -> Table {
    let mut table = new_table(&["#", "Kind", "Count"]);
    for (i, (kind, count)) in plan.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(kind),
            Cell::new(count),
        ]);
    }
    table
}

/// Per-kind results of a run
pub fn report_table(report: &TeardownReport) -> Table {
    let mut table = new_table(&["Kind", "Deleted", "Skipped", "Failed", "Rounds"]);
    for kind in &report.kinds {
        table.add_row(vec![
            Cell::new(&kind.kind),
            Cell::new(kind.deleted),
            Cell::new(kind.skipped),
            Cell::new(kind.failed),
            Cell::new(kind.rounds),
        ]);
    }
    table
}

/// Print the end-of-run summary
pub fn print_outcome(outcome: &TeardownOutcome) {
    if outcome.cancelled {
        println!("Teardown cancelled, nothing was deleted.");
        return;
    }

    println!("\n=== Teardown Report ===");
    println!("Run:        {}", outcome.run_id);
    println!("Discovered: {}", outcome.discovered);
    if !outcome.report.kinds.is_empty() {
        println!("{}", report_table(&outcome.report));
    }
    println!("Removed:    {}", outcome.report.total_removed());
    println!("Failed:     {}", outcome.report.total_failed());
    println!("Elapsed:    {:.1}s", outcome.report.elapsed.as_secs_f64());

    let failed: Vec<_> = outcome.report.failed_kinds().collect();
    if !failed.is_empty() {
        println!("\nKinds with failures:");
        for kind in failed {
            println!("  {} ({} failed)", kind.kind, kind.failed);
        }
    }

    match &outcome.finalize {
        Some(FinalizeOutcome::Deleted) => println!("\nScope deletion initiated."),
        Some(other) => println!("\nScope: {other}"),
        None => {}
    }
}

/// Whether a typed answer matches the expected confirmation word
pub fn accepts(answer: &str, expected: &str) -> bool {
    answer.trim() == expected
}

/// Read one answer line from `input` and check it against `expected`.
///
/// The read blocks, so the worker thread is handed over to the runtime for
/// its duration. Needs the multi-threaded runtime.
pub fn read_confirmation<R: BufRead>(mut input: R, expected: &str) -> bool {
    tokio::task::block_in_place(|| {
        let mut answer = String::new();
        match input.read_line(&mut answer) {
            Ok(_) => accepts(&answer, expected),
            Err(_) => false,
        }
    })
}

/// Prompts on stdout and reads the answer from stdin
#[derive(Debug, Default)]
pub struct StdinConfirmer;

impl StdinConfirmer {
    fn ask(&self, prompt: &str, expected: &str) -> bool {
        print!("{prompt} Type '{expected}' to continue: ");
        let _ = std::io::stdout().flush();
        read_confirmation(std::io::stdin().lock(), expected)
    }
}

impl Confirmer for StdinConfirmer {
    fn confirm_teardown(&self, discovered: &Discovered) -> bool {
        println!("{}", discovery_table(discovered, 0));
        self.ask(
            &format!(
                "This will DELETE {} resources across {} kinds.",
                discovered.total(),
                discovered.kinds().count()
            ),
            "yes",
        )
    }

    fn confirm_scope_deletion(&self, scope: &str) -> bool {
        self.ask(&format!("This will DELETE the scope {scope} itself."), "DELETE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teardown::KindReport;
    use oci_sweep_test_utils::resource;
    use std::io::{BufReader, Read};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Input that produces "yes" only once `open` is set, or EOF after 5s
    struct GatedInput {
        open: Arc<AtomicBool>,
        served: bool,
    }

    impl Read for GatedInput {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Ok(0);
            }
            let deadline = std::time::Instant::now() + Duration::from_secs(5);
            while !self.open.load(Ordering::SeqCst) {
                if std::time::Instant::now() > deadline {
                    return Ok(0);
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            self.served = true;
            let line = b"yes\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn discovery_table_limits_samples() {
        let discovered: Discovered = (0..5)
            .map(|i| resource("Volume", &format!("vol{i}")))
            .chain(std::iter::once(resource("Vcn", "vcn")))
            .collect();

        let rendered = discovery_table(&discovered, 2).to_string();
        assert!(rendered.contains("vol0"));
        assert!(rendered.contains("vol1"));
        assert!(!rendered.contains("vol2"));
        assert!(rendered.contains("3 more"));
        assert!(rendered.contains("vcn"));
    }

    #[test]
    fn plan_is_numbered() {
        let rendered = plan_table(&[("Instance".into(), 2), ("Vcn".into(), 1)]).to_string();
        let instance = rendered.find("Instance").unwrap();
        let vcn = rendered.find("Vcn").unwrap();
        assert!(instance < vcn);
    }

    #[test]
    fn report_lists_kinds() {
        let report = TeardownReport {
            kinds: vec![KindReport {
                deleted: 3,
                failed: 1,
                rounds: 4,
                ..KindReport::new("Subnet")
            }],
            elapsed: Duration::from_secs(2),
        };
        let rendered = report_table(&report).to_string();
        assert!(rendered.contains("Subnet"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn waiting_for_an_answer_leaves_other_tasks_running() {
        let open = Arc::new(AtomicBool::new(false));
        let input = BufReader::new(GatedInput {
            open: open.clone(),
            served: false,
        });

        let prompt = tokio::spawn(async move { read_confirmation(input, "yes") });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let opener = tokio::spawn(async move { open.store(true, Ordering::SeqCst) });

        assert!(prompt.await.unwrap());
        opener.await.unwrap();
    }

    #[test]
    fn confirmation_words_are_exact() {
        assert!(accepts("yes\n", "yes"));
        assert!(!accepts("y\n", "yes"));
        assert!(accepts("DELETE\n", "DELETE"));
        assert!(!accepts("delete\n", "DELETE"));
    }
}
