//! Text projection of the session view. Pure: reads the view, never the controller.

use client_core::SessionView;
use shared::domain::CellKind;

pub fn glyph(kind: CellKind) -> char {
    match kind {
        CellKind::Empty => '.',
        CellKind::Obstacle => '#',
        CellKind::Catcher => 'C',
        CellKind::Runner => 'R',
    }
}

pub fn render(view: &SessionView, tool: CellKind) -> String {
    let mut out = String::new();

    if let Some(error) = &view.error {
        out.push_str(&format!("! {}\n", error.message));
    }

    for row in view.grid.rows() {
        let line: Vec<String> = row.iter().map(|cell| glyph(*cell).to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }

    let readiness = if view.is_simulating {
        "simulation running..."
    } else if view.runnable {
        "ready to start"
    } else {
        "place exactly one runner and one catcher"
    };
    out.push_str(&format!(
        "status: {}  tool: {}  ({readiness})\n",
        view.status, tool
    ));
    out
}
