#![allow(dead_code)]

use anyhow::{bail, Result};
use assert_cmd::cargo;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Three sessions of adjusted closes used by most tests
pub const AAA_PRICES: [(&str, &str); 3] = [
    ("2024-01-02", "100"),
    ("2024-01-03", "105"),
    ("2024-01-04", "110"),
];
pub const BBB_PRICES: [(&str, &str); 3] = [
    ("2024-01-02", "50"),
    ("2024-01-03", "48"),
    ("2024-01-04", "47"),
];

/// Isolated directory holding config, symbols, price cache, charts and outbox
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// AAA and BBB cached, both reports configured
    pub fn standard() -> Self {
        let fixture = Self::new();
        fixture.write_symbols(&["AAA", "BBB"]);
        fixture.write_prices("AAA", &AAA_PRICES);
        fixture.write_prices("BBB", &BBB_PRICES);
        fixture.write_config("AAA = 10\nBBB = 100\n");
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn prices_dir(&self) -> PathBuf {
        self.path().join("prices")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.path().join("outbox")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn write_symbols(&self, symbols: &[&str]) {
        let mut text = String::from("# test universe\n");
        for s in symbols {
            text.push_str(s);
            text.push('\n');
        }
        std::fs::write(self.path().join("symbols.txt"), text).expect("failed to write symbols");
    }

    pub fn write_prices(&self, symbol: &str, prices: &[(&str, &str)]) {
        std::fs::create_dir_all(self.prices_dir()).expect("failed to create prices dir");
        let mut text = String::from("date,open,high,low,close,adj_close,volume\n");
        for (date, price) in prices {
            text.push_str(&format!("{},{},{},{},{},{},1000\n", date, price, price, price, price, price));
        }
        std::fs::write(self.prices_dir().join(format!("{}.csv", symbol)), text)
            .expect("failed to write prices");
    }

    /// `holdings` is the TOML body of the single holdings snapshot
    pub fn write_config(&self, holdings: &str) {
        let text = format!(
            r#"
[historical_data]
symbols_file = "{symbols}"
output_dir = "{prices}"
start_date = "20240101"
end_date = "20240105"

[mailer]
from = "reports@example.com"
to = ["me@example.com"]
outbox_dir = "{outbox}"

[plot]
output_dir = "{charts}"

[portfolio_report]
subject_format = "Portfolio -- %s"

[portfolio_report.dates.20231231.symbols]
{holdings}
[universe_report]
subject_format = "Universe -- %s"
bins = [-5, -1, 0, 1, 5]
bins_is_percent = true
block_count = 10
top_count = 1
"#,
            symbols = self.path().join("symbols.txt").display(),
            prices = self.prices_dir().display(),
            outbox = self.outbox_dir().display(),
            charts = self.path().join("charts").display(),
            holdings = holdings,
        );
        std::fs::write(self.config_path(), text).expect("failed to write config");
    }

    pub fn base_cmd(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("market-report"));
        cmd.env("XDG_CACHE_HOME", self.path().join(".cache"));
        cmd.env("RUST_LOG", "warn");
        cmd.arg("--no-color")
            .arg("--offline")
            .arg("--config-file")
            .arg(self.config_path());
        cmd
    }

    pub fn run_cmd(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = self.base_cmd();
        cmd.args(args);
        let output = cmd.output()?;
        if !output.status.success() {
            bail!(
                "command failed: {:?}\nstdout: {}\nstderr: {}",
                args,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(output)
    }
}
