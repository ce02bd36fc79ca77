use std::path::Path;

#[test]
fn demo_projects_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects");
    let demos = ["tidal_demo.yaml"];

    for name in demos {
        let path = root.join(name);
        let project = bemt_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        bemt_project::validate_project(&project)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
        assert_eq!(
            project.hydrofoils.len(),
            project.operative_state.no_design_points
        );
    }
}
