//! One editing session: interpret, apply, analyze, in that order, one at a time.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use vastu_core::{
    analyze, apply, export_project, import_project, mark_saved, set_compliance, Command,
    ComplianceReport, DesignSnapshot, DesignState, DirectEdit, RuleCatalog, Transition,
};

use crate::{Interpretation, Interpreter, Source};

/// What a described change did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub command: Command,
    pub source: Source,
    pub report: ComplianceReport,
}

pub struct Session {
    state: DesignState,
    interpreter: Interpreter,
    catalog: Arc<RuleCatalog>,
}

impl Session {
    pub fn new(interpreter: Interpreter) -> Self {
        let catalog = interpreter.catalog().clone();
        Self {
            state: DesignState::default(),
            interpreter,
            catalog,
        }
    }

    pub fn state(&self) -> &DesignState {
        &self.state
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Interpret `text`, apply the command and re-score the design.
    pub async fn describe(&mut self, text: &str) -> Outcome {
        let Interpretation { command, source } =
            self.interpreter.interpret(text, &self.state).await;
        debug!(command = command.type_name(), ?source, "applying interpreted command");
        self.transition(Transition::new(command.clone(), text));
        Outcome {
            command,
            source,
            report: self.state.compliance_report.clone(),
        }
    }

    /// Interpret without applying.
    pub async fn preview(&self, text: &str) -> Interpretation {
        self.interpreter.interpret(text, &self.state).await
    }

    /// Apply a direct edit and re-score. Edits naming missing ids change nothing.
    pub fn edit(&mut self, edit: DirectEdit) -> ComplianceReport {
        let edit = self.derive_room_flags(edit);
        let input = edit_input(&edit);
        self.transition(Transition::new(edit, input));
        self.state.compliance_report.clone()
    }

    /// Re-score and store the report.
    pub fn analyze(&mut self) -> ComplianceReport {
        let report = analyze(&self.state, &self.catalog);
        self.state = set_compliance(std::mem::take(&mut self.state), report.clone());
        report
    }

    /// Replace the design with a loaded one and re-score it.
    pub fn load(&mut self, snapshot: DesignSnapshot) -> ComplianceReport {
        self.state = DesignState::from_snapshot(snapshot);
        self.analyze()
    }

    pub fn import(&mut self, data: &str) -> vastu_core::Result<ComplianceReport> {
        let state = import_project(data)?;
        Ok(self.load(state.snapshot()))
    }

    /// Serialize the design as a project file and mark it saved.
    pub fn export(&mut self) -> vastu_core::Result<String> {
        let blob = export_project(&self.state, Utc::now())?;
        self.state = mark_saved(std::mem::take(&mut self.state));
        Ok(blob)
    }

    /// Moving a room or changing its type re-derives `vastuCompliant` and
    /// `vastuReason` from the catalog.
    fn derive_room_flags(&self, edit: DirectEdit) -> DirectEdit {
        let mut patch = match edit {
            DirectEdit::UpdateRoom(patch) if patch.position.is_some() || patch.room_type.is_some() => {
                patch
            }
            other => return other,
        };
        if let Some(room) = self.state.room(&patch.id) {
            let room_type = patch.room_type.unwrap_or(room.room_type);
            let direction = patch
                .position
                .map_or(room.position.direction, |p| p.direction);
            patch.vastu_compliant = Some(self.catalog.is_preferred(room_type, direction));
            patch.vastu_reason = Some(self.catalog.room_reason(room_type, direction));
        }
        DirectEdit::UpdateRoom(patch)
    }

    fn transition(&mut self, transition: Transition) {
        let state = apply(std::mem::take(&mut self.state), transition);
        let report = analyze(&state, &self.catalog);
        self.state = set_compliance(state, report);
    }
}

/// History text for an edit that did not come from an utterance.
fn edit_input(edit: &DirectEdit) -> String {
    match edit {
        DirectEdit::UpdateRoom(patch) => format!("update room {}", patch.id),
        DirectEdit::DeleteRoom(id) => format!("delete room {id}"),
        DirectEdit::UpdateFurniture(patch) => format!("update furniture {}", patch.id),
        DirectEdit::DeleteFurniture(id) => format!("delete furniture {id}"),
        DirectEdit::DeleteEntrance(id) => format!("delete entrance {id}"),
        DirectEdit::AddSiteElement { layer, element } => {
            format!("add {layer:?} {}", element.kind).to_lowercase()
        }
        DirectEdit::DeleteSiteElement(id) => format!("delete element {id}"),
        DirectEdit::UpdateProjectInfo(_) => "update project info".to_string(),
        DirectEdit::SetMode(mode) => format!("set mode {mode:?}").to_lowercase(),
        DirectEdit::ClearDesign => "clear design".to_string(),
    }
}
