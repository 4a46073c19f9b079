//! Plain-text rendering of a snapshot

use crate::types::Snapshot;
use std::fmt::Write;

const NO_VALUE: &str = "-";

/// Render a snapshot as a short multi-section report
pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    out.push_str("Indicadores\n");
    for (code, rate) in &snapshot.currency_rates {
        match rate {
            Some(value) => {
                let _ = writeln!(out, "  {:<4} {:>12.2}", code, value);
            }
            None => {
                let _ = writeln!(out, "  {:<4} {:>12}", code, NO_VALUE);
            }
        }
    }

    out.push_str("Metro\n");
    for (line, status) in &snapshot.network_lines {
        let _ = writeln!(out, "  {:<4} {}", line, status);
        if let Some(incident) = snapshot.line_incidents.get(line) {
            if !incident.affected_stations.is_empty() {
                let stations: Vec<&str> =
                    incident.affected_stations.iter().map(String::as_str).collect();
                let _ = writeln!(out, "       estaciones: {}", stations.join(", "));
            }
            for detail in &incident.details {
                let _ = writeln!(out, "       {}", detail);
            }
        }
    }

    let event = &snapshot.seismic_event;
    out.push_str("Sismo\n");
    let _ = writeln!(
        out,
        "  {} {} {}",
        event.magnitude_label,
        event.reference.as_deref().unwrap_or(NO_VALUE),
        event.timestamp.as_deref().unwrap_or(NO_VALUE)
    );

    out.push_str("Paraderos\n");
    for (stop_id, board) in &snapshot.stop_arrivals {
        let headline = snapshot.headline(stop_id);
        let _ = writeln!(
            out,
            "  {} ({}): {}",
            stop_id,
            board.display_name,
            headline.as_deref().unwrap_or(NO_VALUE)
        );
        for arrival in board.arrivals.iter().skip(1) {
            let _ = writeln!(
                out,
                "       {} → {} ({})",
                arrival.route,
                arrival.destination,
                arrival.eta.as_deref().unwrap_or(NO_VALUE)
            );
        }
    }

    out
}
