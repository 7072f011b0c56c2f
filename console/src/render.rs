use anyhow::Result;
use evadmin_client::PageInfo;
use evadmin_client::resources::{
    ChargingSession, CreatedReservation, Invoice, Location, Plan, Reservation, Station, Vehicle,
};
use serde::Serialize;

/// Something that can be shown as one table line.
pub trait Row: Serialize {
    const HEADER: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

pub fn print_items<T: Row>(items: &[T], page: Option<&PageInfo>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    print!("{}", table(items));
    if let Some(page) = page {
        println!("{}", footer(page));
    }
    Ok(())
}

pub fn print_item<T: Row>(item: &T, json: bool) -> Result<()> {
    print_items(std::slice::from_ref(item), None, json)
}

pub fn table<T: Row>(items: &[T]) -> String {
    let rows: Vec<Vec<String>> = items.iter().map(Row::cells).collect();

    let mut widths: Vec<usize> = T::HEADER.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = T::HEADER.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &header, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    if rows.is_empty() {
        out.push_str("(no results)\n");
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

pub fn footer(page: &PageInfo) -> String {
    format!(
        "page {}/{} ({} total){}{}",
        page.current_page,
        page.total_pages.max(1),
        page.total_count,
        if page.has_previous { " [p]rev" } else { "" },
        if page.has_next { " [n]ext" } else { "" },
    )
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_owned())
}

impl Row for Station {
    const HEADER: &'static [&'static str] = &["ID", "NAME", "LOCATION", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.location_id.clone(),
            self.status.to_string(),
        ]
    }
}

impl Row for Plan {
    const HEADER: &'static [&'static str] = &["ID", "NAME", "TYPE", "PRICE", "MAX KWH/DAY"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.details.name.clone(),
            self.details.kind.clone(),
            format!("{:.2}", self.details.price),
            optional(self.details.max_daily_kwh),
        ]
    }
}

impl Row for Vehicle {
    const HEADER: &'static [&'static str] = &["ID", "MAKE", "MODEL", "YEAR", "PLATE", "CONNECTOR"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.details.make.clone(),
            self.details.model.clone(),
            self.details.year.to_string(),
            self.details.license_plate.clone(),
            self.details.connector_type.to_string(),
        ]
    }
}

impl Row for Reservation {
    const HEADER: &'static [&'static str] = &["ID", "USER", "STATION", "START", "END", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user.clone(),
            self.station.name.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            self.status.to_string(),
        ]
    }
}

impl Row for CreatedReservation {
    const HEADER: &'static [&'static str] = &["ID", "USER", "STATION", "START", "END", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user.clone(),
            self.station_name.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            self.status.to_string(),
        ]
    }
}

impl Row for Invoice {
    const HEADER: &'static [&'static str] = &["ID", "USER", "STATUS", "TOTAL", "DUE", "DUE DATE"];

    fn cells(&self) -> Vec<String> {
        let user = if self.user_email.is_empty() {
            &self.user_id
        } else {
            &self.user_email
        };
        vec![
            self.id.clone(),
            user.clone(),
            self.status.to_string(),
            format!("{:.2}", self.total_amount),
            format!("{:.2}", self.amount_due),
            self.due_date.clone(),
        ]
    }
}

impl Row for ChargingSession {
    const HEADER: &'static [&'static str] =
        &["ID", "USER", "CONNECTOR", "START", "END", "KWH", "COST", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user_email.clone(),
            self.connector_id.clone(),
            self.start_time.clone(),
            optional(self.end_time.as_deref()),
            format!("{:.2}", self.energy_kwh),
            format!("{:.2}", self.cost),
            self.status.to_string(),
        ]
    }
}

impl Row for Location {
    const HEADER: &'static [&'static str] = &["ID", "NAME", "CITY", "COUNTRY", "ADDRESS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.city.clone(),
            self.country.clone(),
            self.address.clone(),
        ]
    }
}
