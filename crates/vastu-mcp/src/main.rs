use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vastu_assist::{engine, Interpreter, Session};
use vastu_core::rules::position_for;
use vastu_core::state::{FurniturePatch, ProjectPatch, RoomPatch};
use vastu_core::{
    ai_configured, read_settings, Dimensions, Direction, DirectEdit, FurnitureType, Mode,
    Placement, RoomType, RuleCatalog, Settings, SiteElementDraft, SiteLayer, Vec3,
};

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct TextRequest {
    /// What to design, in plain words, e.g. "Create a 3-bedroom house" or "Add a kitchen"
    text: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct IdRequest {
    /// ID of the entity (e.g. "room-2", "furniture-1", "entrance-1")
    id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateRoomRequest {
    /// ID of the room to update (e.g. "room-3")
    id: String,
    /// New display name
    name: Option<String>,
    /// New room type: bedroom, kitchen, living_room, bathroom, dining_room, study_room, pooja_room
    room_type: Option<RoomType>,
    /// Move the room to the standard spot of this zone. Ignored when `position` is given.
    direction: Option<Direction>,
    /// Exact plan position {x, z, direction}
    position: Option<Placement>,
    /// New size {width, height, depth}; non-positive axes keep their current value
    dimensions: Option<Dimensions>,
    /// Display color, e.g. "#8b5cf6"
    color: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateFurnitureRequest {
    /// ID of the furniture item to update (e.g. "furniture-1")
    id: String,
    /// New furniture type: bed, sofa, table, chair, wardrobe, dining_table, study_table
    furniture_type: Option<FurnitureType>,
    /// Room to move the item into, or "unassigned"
    room_id: Option<String>,
    /// Position within the room {x, y, z}
    position: Option<Vec3>,
    /// Rotation in radians {x, y, z}; y is the facing angle (0 = north, pi = south)
    rotation: Option<Vec3>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetModeRequest {
    /// "interior", "exterior" or "landscape"
    mode: Mode,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateProjectRequest {
    /// Project name, used when the project is exported
    name: Option<String>,
    description: Option<String>,
    /// Project type, e.g. "residential" or "commercial"
    project_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddSiteElementRequest {
    /// "exterior" (gates, boundary walls, parking) or "landscape" (trees, ponds, gardens)
    layer: SiteLayer,
    /// What it is, e.g. "gate", "tree", "pond"
    kind: String,
    /// Display name; defaults to the kind
    name: Option<String>,
    /// Zone to place it in, at the standard spot of that zone
    direction: Direction,
    /// Size {width, height, depth}; defaults to 3 x 3 x 3
    dimensions: Option<Dimensions>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ImportRequest {
    /// A project file as produced by export_design
    data: String,
}

// --- Server ---

#[derive(Clone)]
pub struct VastuServer {
    session: Arc<Mutex<Session>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl VastuServer {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Describe a change in plain words. The request is turned into a design command, applied, and the design is re-scored. Returns {command, source, report} where source says whether the heuristic or the remote model produced the command."
    )]
    async fn describe(
        &self,
        Parameters(req): Parameters<TextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let outcome = session.describe(&req.text).await;
        json_result(&outcome)
    }

    #[tool(description = "Show the command a request would produce without applying it")]
    async fn preview(
        &self,
        Parameters(req): Parameters<TextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        let interpretation = session.preview(&req.text).await;
        json_result(&interpretation)
    }

    #[tool(
        description = "Re-score the design. Returns {score (0-100), violations: [{type, severity, message}], suggestions, compliance (excellent|good|fair|poor)}"
    )]
    async fn analyze(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        json_result(&session.analyze())
    }

    #[tool(
        description = "Get the full design: info, mode, rooms, furniture, entrances, exteriorElements, landscapeElements, complianceReport, history and unsavedChanges"
    )]
    async fn get_design(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        json_result(session.state())
    }

    #[tool(description = "Update fields of an existing room. Returns the new compliance report.")]
    async fn update_room(
        &self,
        Parameters(req): Parameters<UpdateRoomRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if session.state().room(&req.id).is_none() {
            return Ok(not_found("room", &req.id));
        }
        let position = req.position.or_else(|| req.direction.map(position_for));
        let report = session.edit(DirectEdit::UpdateRoom(RoomPatch {
            id: req.id,
            name: req.name,
            room_type: req.room_type,
            position,
            dimensions: req.dimensions,
            color: req.color,
            ..RoomPatch::default()
        }));
        json_result(&report)
    }

    #[tool(description = "Delete a room and all furniture inside it")]
    async fn delete_room(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if session.state().room(&req.id).is_none() {
            return Ok(not_found("room", &req.id));
        }
        json_result(&session.edit(DirectEdit::DeleteRoom(req.id)))
    }

    #[tool(description = "Update an existing furniture item. Returns the new compliance report.")]
    async fn update_furniture(
        &self,
        Parameters(req): Parameters<UpdateFurnitureRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if !session.state().furniture.iter().any(|f| f.id == req.id) {
            return Ok(not_found("furniture", &req.id));
        }
        let report = session.edit(DirectEdit::UpdateFurniture(FurniturePatch {
            id: req.id,
            furniture_type: req.furniture_type,
            room_id: req.room_id,
            position: req.position,
            rotation: req.rotation,
            ..FurniturePatch::default()
        }));
        json_result(&report)
    }

    #[tool(description = "Delete a furniture item")]
    async fn delete_furniture(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if !session.state().furniture.iter().any(|f| f.id == req.id) {
            return Ok(not_found("furniture", &req.id));
        }
        json_result(&session.edit(DirectEdit::DeleteFurniture(req.id)))
    }

    #[tool(description = "Delete an entrance")]
    async fn delete_entrance(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if !session.state().entrances.iter().any(|e| e.id == req.id) {
            return Ok(not_found("entrance", &req.id));
        }
        json_result(&session.edit(DirectEdit::DeleteEntrance(req.id)))
    }

    #[tool(description = "Place an exterior or landscape element around the building")]
    async fn add_site_element(
        &self,
        Parameters(req): Parameters<AddSiteElementRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.edit(DirectEdit::AddSiteElement {
            layer: req.layer,
            element: SiteElementDraft {
                name: req.name.unwrap_or_default(),
                kind: req.kind,
                position: position_for(req.direction),
                dimensions: req.dimensions.unwrap_or_default(),
            },
        });
        json_result(session.state().site_elements(req.layer))
    }

    #[tool(description = "Delete an exterior or landscape element")]
    async fn delete_site_element(
        &self,
        Parameters(req): Parameters<IdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let state = session.state();
        let exists = state
            .exterior_elements
            .iter()
            .chain(&state.landscape_elements)
            .any(|e| e.id == req.id);
        if !exists {
            return Ok(not_found("site element", &req.id));
        }
        json_result(&session.edit(DirectEdit::DeleteSiteElement(req.id)))
    }

    #[tool(description = "Update the project name, description or type")]
    async fn update_project(
        &self,
        Parameters(req): Parameters<UpdateProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.edit(DirectEdit::UpdateProjectInfo(ProjectPatch {
            name: req.name,
            description: req.description,
            project_type: req.project_type,
        }));
        json_result(&session.state().info)
    }

    #[tool(description = "Switch between interior, exterior and landscape mode")]
    async fn set_mode(
        &self,
        Parameters(req): Parameters<SetModeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.edit(DirectEdit::SetMode(req.mode));
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Mode set to {:?}",
            req.mode
        ))]))
    }

    #[tool(description = "Remove every room, furniture item and entrance. The clear is kept in history.")]
    async fn clear_design(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.edit(DirectEdit::ClearDesign);
        Ok(CallToolResult::success(vec![Content::text("Design cleared")]))
    }

    #[tool(description = "Get the Vastu placement rules used for interpreting and scoring designs")]
    async fn get_rules(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        Ok(CallToolResult::success(vec![Content::text(
            session.catalog().prompt_rules(),
        )]))
    }

    #[tool(
        description = "Export the design as a versioned project file ({version, project, exportedAt}). Marks the design as saved."
    )]
    async fn export_design(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        match session.export() {
            Ok(blob) => Ok(CallToolResult::success(vec![Content::text(blob)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to export design: {e}"
            ))])),
        }
    }

    #[tool(description = "Replace the design with a project file produced by export_design")]
    async fn import_design(
        &self,
        Parameters(req): Parameters<ImportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        match session.import(&req.data) {
            Ok(report) => json_result(&report),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to import design: {e}"
            ))])),
        }
    }

    #[tool(description = "Show whether a remote text-generation backend is in use, and which model")]
    async fn backend_status(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        json_result(&session.interpreter().status())
    }
}

#[tool_handler]
impl ServerHandler for VastuServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Helpers ---

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
            "Serialization error: {e}"
        ))])),
    }
}

fn not_found(kind: &str, id: &str) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!(
        "No {kind} with id '{id}'. The design is unchanged."
    ))])
}

const INSTRUCTIONS: &str = r#"Vastu design assistant. Build a floor plan by describing it with `describe` ("Create a 3-bedroom house", "Add a kitchen", "Add a sofa", "Add the main entrance"). Every change is scored against Vastu placement rules; read the returned report and fix violations with `update_room` / `update_furniture`, or ask `get_rules` for the rules.
Use `preview` to see what a request would do before applying it. `update_project` names the project, and `add_site_element` places gates, walls, trees or ponds outside the building. `get_design` returns the full state. `export_design` / `import_design` save and restore a project."#;

fn load_catalog(settings: &Settings) -> RuleCatalog {
    let Some(path) = &settings.catalog_path else {
        return RuleCatalog::standard();
    };
    match RuleCatalog::load(path) {
        Ok(catalog) => {
            info!(path = %path.display(), "loaded rule catalog");
            catalog
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load rule catalog, using built-in rules");
            RuleCatalog::standard()
        }
    }
}

async fn build_interpreter(settings: &Settings, catalog: Arc<RuleCatalog>) -> Interpreter {
    let Some(backend) = engine::from_settings(settings) else {
        info!("no backend configured, using heuristics");
        return Interpreter::offline(catalog);
    };
    if !ai_configured(settings) {
        warn!(backend = backend.name(), "backend settings incomplete, using heuristics");
        return Interpreter::offline(catalog);
    }
    Interpreter::connect(
        catalog,
        backend,
        &settings.model,
        Duration::from_secs(settings.timeout_secs),
    )
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let settings = read_settings().with_env();
    let catalog = Arc::new(load_catalog(&settings));
    let interpreter = build_interpreter(&settings, catalog).await;

    let service = VastuServer::new(Session::new(interpreter))
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> VastuServer {
        VastuServer::new(Session::new(Interpreter::offline(Arc::new(
            RuleCatalog::standard(),
        ))))
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn describe_then_move_room() {
        let server = server();
        let out = server
            .describe(Parameters(TextRequest {
                text: "add a bedroom".into(),
            }))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&text(&out)).unwrap();
        assert_eq!(json["command"]["type"], "ADD_ROOM");
        assert_eq!(json["source"]["kind"], "heuristic");
        assert_eq!(json["report"]["score"], 100);

        let out = server
            .update_room(Parameters(UpdateRoomRequest {
                id: "room-1".into(),
                name: None,
                room_type: None,
                direction: Some(Direction::Northeast),
                position: None,
                dimensions: None,
                color: None,
            }))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&text(&out)).unwrap();
        assert_eq!(json["score"], 90);

        let design = server.get_design().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&text(&design)).unwrap();
        assert_eq!(json["rooms"][0]["vastuCompliant"], false);
        assert_eq!(
            json["rooms"][0]["vastuReason"],
            "Bedroom in northeast for rest and stability"
        );
    }

    #[tokio::test]
    async fn project_and_site_survive_export() {
        let server = server();
        server
            .update_project(Parameters(UpdateProjectRequest {
                name: Some("Lake House".into()),
                description: None,
                project_type: None,
            }))
            .await
            .unwrap();
        let out = server
            .add_site_element(Parameters(AddSiteElementRequest {
                layer: SiteLayer::Exterior,
                kind: "gate".into(),
                name: None,
                direction: Direction::North,
                dimensions: None,
            }))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&text(&out)).unwrap();
        assert_eq!(json[0]["id"], "exterior-1");
        assert_eq!(json[0]["name"], "gate");

        let blob = text(&server.export_design().await.unwrap());
        let other = VastuServer::new(Session::new(Interpreter::offline(Arc::new(
            RuleCatalog::standard(),
        ))));
        let out = other
            .import_design(Parameters(ImportRequest { data: blob }))
            .await
            .unwrap();
        assert_ne!(out.is_error, Some(true));
        let design = other.get_design().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&text(&design)).unwrap();
        assert_eq!(json["info"]["name"], "Lake House");
        assert_eq!(json["exteriorElements"][0]["kind"], "gate");
    }

    #[tokio::test]
    async fn missing_ids_are_tool_errors() {
        let server = server();
        let out = server
            .delete_room(Parameters(IdRequest {
                id: "room-9".into(),
            }))
            .await
            .unwrap();
        assert_eq!(out.is_error, Some(true));
        assert!(text(&out).contains("room-9"));
    }

    #[tokio::test]
    async fn bad_import_is_a_tool_error() {
        let server = server();
        let out = server
            .import_design(Parameters(ImportRequest {
                data: "{}".into(),
            }))
            .await
            .unwrap();
        assert_eq!(out.is_error, Some(true));
    }
}
