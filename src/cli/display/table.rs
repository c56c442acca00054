//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::workflow::{BootstrapReport, DeployReport};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Summary of a completed deploy: one row for the service, then its units.
    pub fn render_deploy(&self, report: &DeployReport) -> String {
        let created = report.units.len();
        let icon = StatusIcon::for_units(created, created, report.subordinate);
        let status = StatusIcon::status_text(created, created, report.subordinate);
        let color = self.theme.units_color(created, created, report.subordinate);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("SERVICE").set_alignment(CellAlignment::Left),
                Cell::new("CHARM").set_alignment(CellAlignment::Left),
                Cell::new("UNITS").set_alignment(CellAlignment::Center),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);

        let units = if report.subordinate {
            "-".to_string()
        } else {
            report.units.join(", ")
        };
        table.add_row(vec![
            Cell::new(&report.service),
            Cell::new(report.charm_url.to_string()).fg(self.theme.info),
            Cell::new(units).fg(color),
            Cell::new(format!("{} {}", icon, status)).fg(color),
        ]);

        let mut output = String::new();
        output.push_str(&format!(
            "Deployed {} {}\n",
            report.service.bold(),
            format!("[{} units]", created).bright_black()
        ));
        output.push_str(&table.to_string());
        output
    }

    /// Summary of a deploy whose service exists but whose units could not be
    /// created.
    pub fn render_partial(&self, service: &str, requested: u32) -> String {
        let requested = requested as usize;
        let icon = StatusIcon::for_units(0, requested, false);
        let status = StatusIcon::status_text(0, requested, false);
        let color = self.theme.units_color(0, requested, false);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("SERVICE").set_alignment(CellAlignment::Left),
                Cell::new("UNITS").set_alignment(CellAlignment::Center),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);
        table.add_row(vec![
            Cell::new(service),
            Cell::new(format!("0/{}", requested)).fg(color),
            Cell::new(format!("{} {}", icon, status)).fg(color),
        ]);

        let mut output = String::new();
        output.push_str(&format!(
            "Created service {} {}\n",
            service.bold(),
            "[units not created]".red()
        ));
        output.push_str(&table.to_string());
        output
    }

    pub fn render_bootstrap(&self, report: &BootstrapReport) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("MACHINE").set_alignment(CellAlignment::Center),
                Cell::new("INSTANCE").set_alignment(CellAlignment::Left),
                Cell::new("ENV TYPE").set_alignment(CellAlignment::Left),
                Cell::new("STATE SERVERS").set_alignment(CellAlignment::Left),
            ]);
        table.add_row(vec![
            Cell::new(&report.machine_id).fg(self.theme.success),
            Cell::new(&report.instance_id),
            Cell::new(&report.env_type),
            Cell::new(report.state_addrs.join("\n")).fg(self.theme.muted),
        ]);

        let mut output = String::new();
        output.push_str(&format!(
            "{} Bootstrapped environment\n",
            StatusIcon::DEPLOYED.green()
        ));
        output.push_str(&table.to_string());
        output
    }
}
