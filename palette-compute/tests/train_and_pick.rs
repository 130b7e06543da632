use color_lib::Context;
use indicatif::ProgressBar;
use palette_compute::corpus::{read_json, write_json, PaletteInput, PaletteRecord};
use palette_compute::{train, Baseline, Pipeline, RayonExecutor};
use palette_sort::select::select;
use palette_sort::{StandardMetrics, TrainedEntry, STANDARD};
use regex::Regex;

fn palette(key: &str, colors: &[&str]) -> PaletteInput {
    PaletteInput {
        key: key.to_string(),
        colors: colors.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_compute_train_pick() {
    let dir = tempfile::tempdir().unwrap();
    let palettes = vec![
        palette(
            "sweetie",
            &["#1a1c2c", "#5d275d", "#b13e53", "#ef7d57", "#ffcd75", "#a7f070", "#38b764", "#257179"],
        ),
        palette(
            "bright",
            &["#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6"],
        ),
        palette("tiny", &["#000000", "#ffffff"]),
    ];

    let pattern = Regex::new(r"^(NONE|NNA:.*|RAMP:.*|HILBERT:.*)$").unwrap();
    let pipeline = Pipeline::new(&STANDARD, &StandardMetrics).with_filter(&pattern);
    let executor = RayonExecutor::new(2).unwrap();
    let states = pipeline.compute(palettes.clone(), &Baseline::Original, &executor, &ProgressBar::hidden());
    assert_eq!(states.len(), 3);
    for state in &states {
        assert!(state.is_complete(), "{}", state.key);
        assert!(state.best.is_some(), "{}", state.key);
    }

    let results_path = dir.path().join("results.json");
    let records: Vec<PaletteRecord> = states.iter().map(|s| s.to_record(&STANDARD)).collect();
    write_json(&results_path, &records).unwrap();
    let records: Vec<PaletteRecord> = read_json(&results_path).unwrap();
    for record in &records {
        let best_groups = record
            .groups
            .iter()
            .filter(|g| g.methods.iter().any(|m| m.best))
            .count();
        assert_eq!(best_groups, 1, "{}", record.key);
    }

    let trained_path = dir.path().join("trained.json");
    write_json(&trained_path, &train(&records)).unwrap();
    let trained: Vec<TrainedEntry> = read_json(&trained_path).unwrap();
    // The tiny palette has no fingerprint and teaches nothing.
    assert!(!trained.is_empty());
    assert!(trained.iter().all(|e| e.colors == 8));
    assert!(trained.iter().any(|e| e.mid == "NONE"));

    let mut ctx = Context::new();
    let selection = select(&trained, &palettes[1].colors, &mut ctx).unwrap();
    assert!(STANDARD.get(&selection.id).is_some());
    assert!(selection.similarity > 0.0);
    // Larger palettes fall back to the 8-color entries.
    let mut larger = palettes[1].colors.clone();
    larger.push("#808000".to_string());
    assert!(select(&trained, &larger, &mut ctx).is_ok());
}
