use crate::camera::CameraPose;
use crate::collection::{CollectionKey, Record};
use crate::hud::HudView;
use crate::session::NavigatorSnapshot;
use crate::sync::{Resolution, SyncPhase};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Regenerate the front-end type definitions under `out_dir`.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<CollectionKey>(out_dir)?;
    export_single_type::<Record>(out_dir)?;
    export_single_type::<CameraPose>(out_dir)?;
    export_single_type::<SyncPhase>(out_dir)?;
    export_single_type::<Resolution>(out_dir)?;
    export_single_type::<HudView>(out_dir)?;
    export_single_type::<NavigatorSnapshot>(out_dir)?;

    let index_content = r#"export type { CollectionKey } from "./CollectionKey";
export type { CollectionRecord } from "./CollectionRecord";
export type { CameraPose } from "./CameraPose";
export type { SyncPhase } from "./SyncPhase";
export type { Resolution } from "./Resolution";
export type { HudView } from "./HudView";
export type { NavigatorSnapshot } from "./NavigatorSnapshot";
"#;

    fs::write(out_dir.join("index.ts"), index_content).map_err(|err| {
        format!(
            "Failed to write {}: {err}",
            out_dir.join("index.ts").display()
        )
    })?;

    Ok(())
}
