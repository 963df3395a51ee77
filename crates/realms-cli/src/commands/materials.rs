use realms_core::{Material, MaterialCatalog};

use super::{print_json, CmdResult, Context};

pub fn run(available: bool, character: Option<String>) -> CmdResult {
    let ctx = Context::open(character)?;
    let materials: Vec<&Material> = if available {
        ctx.service.available_materials(&ctx.character)?
    } else {
        ctx.service.catalog().all()
    };
    print_json(&materials)
}
