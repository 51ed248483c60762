//! Test helpers for composing corpus files and layered overrides.

use super::*;
use crate::extract::{ExtractArgs, ExtractConfig, resolve_extract_config};
use bzip2::{Compression, write::BzEncoder};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use footprint_data::test_support::CorpusBuilder;
use std::{fs, io::Write};
use tempfile::TempDir;

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) input: Option<Utf8PathBuf>,
    pub(super) left: Option<f64>,
    pub(super) start: Option<NaiveDate>,
    pub(super) end: Option<NaiveDate>,
}

/// A small city: node 1 inside a 0..20 degree box, node 2 outside, and a
/// way referencing both.
pub(super) fn city_corpus() -> String {
    CorpusBuilder::new()
        .tagged_node(1, 10.0, 10.0, "name", "inside")
        .node(2, 80.0, 80.0)
        .way(10, &[1, 2])
        .changeset(1)
        .build()
}

/// Write `corpus` to `path`, bzip2-compressed when the name ends in `.bz2`.
pub(super) fn write_corpus(path: &Utf8Path, corpus: &str) {
    let bytes = if path.as_str().ends_with(".bz2") {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(corpus.as_bytes()).expect("compress corpus");
        encoder.finish().expect("finish compression")
    } else {
        corpus.as_bytes().to_vec()
    };
    fs::write(path, bytes).expect("write corpus");
}

#[derive(Debug)]
pub(super) struct CorpusFiles {
    _dir: TempDir,
    root: Utf8PathBuf,
    cli_input: Utf8PathBuf,
    config_input: Utf8PathBuf,
}

impl CorpusFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let cli_input = root.join("cli.osm.bz2");
        let config_input = root.join("config.osm");
        write_corpus(&cli_input, &city_corpus());
        write_corpus(&config_input, &city_corpus());
        Self {
            _dir: dir,
            root,
            cli_input,
            config_input,
        }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn input(&self) -> &Utf8Path {
        &self.cli_input
    }

    pub(super) fn config_input(&self) -> &Utf8Path {
        &self.config_input
    }
}

pub(super) fn merge_layers(
    mut cli_args: ExtractArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<ExtractConfig, CliError> {
    merge_field(
        &mut cli_args.input,
        extract_field(&env_layer, |layer| &layer.input),
        extract_field(&file_layer, |layer| &layer.input),
    );
    merge_field(
        &mut cli_args.left,
        extract_field(&env_layer, |layer| &layer.left),
        extract_field(&file_layer, |layer| &layer.left),
    );
    merge_field(
        &mut cli_args.start,
        extract_field(&env_layer, |layer| &layer.start),
        extract_field(&file_layer, |layer| &layer.start),
    );
    merge_field(
        &mut cli_args.end,
        extract_field(&env_layer, |layer| &layer.end),
        extract_field(&file_layer, |layer| &layer.end),
    );
    resolve_extract_config(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: &Option<LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.as_ref().and_then(|entry| accessor(entry).clone())
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}
