use super::*;
use crate::config::AppConfig;
use crate::types::{Node, NodeId, PortRef};
use eframe::egui;

fn screen() -> Option<egui::Rect> {
    Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ))
}

/// App whose canvas maps world coordinates 1:1 onto the screen.
fn app_with_identity_canvas() -> FlowsheetApp {
    let mut app = FlowsheetApp::default();
    app.canvas.anchored = true; // skip anchoring to the panel corner
    app.canvas.offset = egui::Vec2::ZERO;
    app.canvas.zoom_factor = 1.0;
    app
}

fn add(app: &mut FlowsheetApp, unit_type: &str, name: &str, pos: (f32, f32)) -> NodeId {
    let node: Node = app.factory.create(unit_type, name, pos).unwrap();
    app.flowsheet.add_node(node)
}

/// Runs one headless frame that draws the canvas.
fn canvas_frame(ctx: &egui::Context, app: &mut FlowsheetApp, events: Vec<egui::Event>) {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    raw.events = events;
    let _ = ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });
}

/// Runs one headless frame that only processes keyboard shortcuts.
fn key_frame(
    ctx: &egui::Context,
    app: &mut FlowsheetApp,
    key: egui::Key,
    modifiers: egui::Modifiers,
) {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    raw.modifiers = modifiers;
    raw.events = vec![egui::Event::Key {
        key,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers,
    }];
    let _ = ctx.run(raw, |ctx| {
        app.handle_shortcuts(ctx);
    });
}

fn button(pos: egui::Pos2, pressed: bool) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed,
        modifiers: egui::Modifiers::NONE,
    }
}

/// Press at `from`, move to `to`, release; each step in its own frame.
fn drag(ctx: &egui::Context, app: &mut FlowsheetApp, from: egui::Pos2, to: egui::Pos2) {
    canvas_frame(ctx, app, vec![egui::Event::PointerMoved(from)]);
    canvas_frame(ctx, app, vec![egui::Event::PointerMoved(from), button(from, true)]);
    canvas_frame(ctx, app, vec![egui::Event::PointerMoved(to)]);
    canvas_frame(ctx, app, vec![button(to, false)]);
}

#[test]
fn clicking_canvas_selects_node() {
    let mut app = app_with_identity_canvas();
    let pipe = add(&mut app, "Pipe", "P-1", (200.0, 150.0));

    let ctx = egui::Context::default();
    let center = egui::pos2(280.0, 185.0);
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(center)]);
    canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(center), button(center, true)],
    );

    assert_eq!(app.interaction.selected_nodes, vec![pipe]);
    assert_eq!(app.interaction.properties_target, Some(pipe));
}

#[test]
fn clicking_empty_canvas_clears_selection() {
    let mut app = app_with_identity_canvas();
    let pipe = add(&mut app, "Pipe", "P-1", (200.0, 150.0));
    app.interaction.selected_nodes = vec![pipe];
    app.interaction.properties_target = Some(pipe);

    let ctx = egui::Context::default();
    let empty = egui::pos2(700.0, 600.0);
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(empty)]);
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(empty), button(empty, true)]);

    assert!(app.interaction.selected_nodes.is_empty());
    assert_eq!(app.interaction.properties_target, None);
}

#[test]
fn dragging_node_moves_it_and_records_undo() {
    let mut app = app_with_identity_canvas();
    let pipe = add(&mut app, "Pipe", "P-1", (200.0, 150.0));

    let ctx = egui::Context::default();
    drag(&ctx, &mut app, egui::pos2(280.0, 185.0), egui::pos2(330.0, 215.0));

    assert_eq!(app.flowsheet.node(pipe).unwrap().position, (250.0, 180.0));
    assert!(app.file.has_unsaved_changes);
    assert!(app.interaction.dragging_node.is_none());

    app.perform_undo();
    assert_eq!(app.flowsheet.node(pipe).unwrap().position, (200.0, 150.0));
    app.perform_redo();
    assert_eq!(app.flowsheet.node(pipe).unwrap().position, (250.0, 180.0));
}

#[test]
fn dragging_selection_moves_all_selected_nodes() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    let b = add(&mut app, "Tank", "T-2", (400.0, 100.0));
    app.interaction.selected_nodes = vec![a, b];

    app.press((160.0, 180.0), egui::Modifiers::NONE, 0.0);
    app.drag_to((170.0, 200.0), false);
    app.release();

    assert_eq!(app.flowsheet.node(a).unwrap().position, (110.0, 120.0));
    assert_eq!(app.flowsheet.node(b).unwrap().position, (410.0, 120.0));

    // One undo step restores both
    app.perform_undo();
    assert_eq!(app.flowsheet.node(a).unwrap().position, (100.0, 100.0));
    assert_eq!(app.flowsheet.node(b).unwrap().position, (400.0, 100.0));
}

#[test]
fn alt_drag_snaps_to_grid() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));

    app.press((160.0, 180.0), egui::Modifiers::NONE, 0.0);
    app.drag_to((173.0, 189.0), true);
    app.release();

    assert_eq!(app.flowsheet.node(tank).unwrap().position, (120.0, 100.0));
}

#[test]
fn dragging_from_output_port_connects_to_input() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Valve", "V-1", (100.0, 100.0));
    let b = add(&mut app, "Valve", "V-2", (400.0, 100.0));

    let ctx = egui::Context::default();
    drag(&ctx, &mut app, egui::pos2(180.0, 125.0), egui::pos2(398.0, 127.0));

    assert_eq!(app.flowsheet.connections.len(), 1);
    let connection = app.flowsheet.connections[0];
    assert_eq!(connection.from, PortRef::output(a, 0));
    assert_eq!(connection.to, PortRef::input(b, 0));
    assert!(app.interaction.pending_connection.is_none());
    // Starting a connection neither moves nor selects the source
    assert_eq!(app.flowsheet.node(a).unwrap().position, (100.0, 100.0));

    app.perform_undo();
    assert!(app.flowsheet.connections.is_empty());
}

#[test]
fn dragging_from_input_port_connects_backwards() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Valve", "V-1", (100.0, 100.0));
    let b = add(&mut app, "Valve", "V-2", (400.0, 100.0));

    app.press((400.0, 125.0), egui::Modifiers::NONE, 0.0);
    app.drag_to((182.0, 124.0), false);
    app.release();

    assert_eq!(app.flowsheet.connections.len(), 1);
    assert_eq!(app.flowsheet.connections[0].from, PortRef::output(a, 0));
    assert_eq!(app.flowsheet.connections[0].to, PortRef::input(b, 0));
}

#[test]
fn occupied_input_rejects_second_connection() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Valve", "V-1", (100.0, 100.0));
    let b = add(&mut app, "Valve", "V-2", (400.0, 100.0));
    let d = add(&mut app, "Valve", "V-3", (100.0, 300.0));
    app.flowsheet
        .connect(PortRef::output(a, 0), PortRef::input(b, 0))
        .unwrap();

    app.press((180.0, 325.0), egui::Modifiers::NONE, 0.0);
    app.drag_to((400.0, 125.0), false);
    app.release();

    assert_eq!(app.flowsheet.connections.len(), 1);
    assert!(app.flowsheet.port_connection(PortRef::output(d, 0)).is_none());
    assert!(!app.undo_history.can_undo());
}

#[test]
fn releasing_over_nothing_drops_connection() {
    let mut app = app_with_identity_canvas();
    add(&mut app, "Valve", "V-1", (100.0, 100.0));

    app.press((180.0, 125.0), egui::Modifiers::NONE, 0.0);
    app.drag_to((600.0, 600.0), false);
    assert!(app.interaction.pending_connection.is_some());
    app.release();

    assert!(app.flowsheet.connections.is_empty());
    assert!(app.interaction.pending_connection.is_none());
}

#[test]
fn shift_press_on_empty_canvas_starts_marquee() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Valve", "V-1", (100.0, 100.0));
    let b = add(&mut app, "Valve", "V-2", (300.0, 100.0));
    let far = add(&mut app, "Valve", "V-3", (900.0, 700.0));
    app.interaction.selected_nodes = vec![far];

    app.press((20.0, 20.0), egui::Modifiers::SHIFT, 0.0);
    assert!(app.interaction.marquee.is_some());
    app.drag_to((500.0, 300.0), false);
    app.release();

    assert!(app.interaction.marquee.is_none());
    // Marquee adds to the existing selection
    assert_eq!(app.interaction.selected_nodes, vec![far, a, b]);
}

#[test]
fn ctrl_click_adds_to_selection() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    let b = add(&mut app, "Tank", "T-2", (400.0, 100.0));

    app.press((160.0, 180.0), egui::Modifiers::NONE, 0.0);
    app.release();
    app.press((460.0, 180.0), egui::Modifiers::CTRL, 1.0);
    app.release();
    assert_eq!(app.interaction.selected_nodes, vec![a, b]);

    // A plain click on an unselected node replaces the selection
    app.press((160.0, 180.0), egui::Modifiers::NONE, 2.0);
    app.release();
    app.interaction.selected_nodes.retain(|id| *id == a);
    app.press((460.0, 180.0), egui::Modifiers::NONE, 3.0);
    app.release();
    assert_eq!(app.interaction.selected_nodes, vec![b]);
}

#[test]
fn double_click_opens_properties() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));

    app.press((160.0, 180.0), egui::Modifiers::NONE, 1.0);
    app.release();
    app.press((160.0, 180.0), egui::Modifiers::NONE, 1.5);
    app.release();
    assert!(!app.interaction.show_properties, "0.5 s apart is two clicks");

    app.press((160.0, 180.0), egui::Modifiers::NONE, 1.7);
    app.release();
    assert!(app.interaction.show_properties);
    assert_eq!(app.interaction.properties_target, Some(tank));
    assert_eq!(app.interaction.temp_node_name, "T-1");
}

#[test]
fn press_is_ignored_while_add_unit_popup_is_open() {
    let mut app = app_with_identity_canvas();
    add(&mut app, "Tank", "T-1", (100.0, 100.0));
    app.interaction.add_unit_popup_open = true;

    app.press((160.0, 180.0), egui::Modifiers::NONE, 0.0);
    assert!(app.interaction.selected_nodes.is_empty());
    assert!(app.interaction.dragging_node.is_none());
}

#[test]
fn add_unit_names_and_centres_new_node() {
    let mut app = app_with_identity_canvas();

    let first = app.add_unit("Valve").unwrap();
    let second = app.add_unit("Valve").unwrap();

    let node = app.flowsheet.node(first).unwrap();
    assert_eq!(node.name, "Valve 1");
    assert_eq!(node.center(), (0.0, 0.0));
    assert_eq!(app.flowsheet.node(second).unwrap().name, "Valve 2");
    assert_eq!(app.interaction.selected_nodes, vec![second]);
    assert!(app.add_unit("Reactor").is_err());
}

#[test]
fn add_unit_uses_visible_canvas_centre() {
    let mut app = app_with_identity_canvas();
    app.canvas.last_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(800.0, 600.0),
    ));
    app.canvas.offset = egui::vec2(-100.0, 50.0);

    let id = app.add_unit("Mixer").unwrap();
    assert_eq!(app.flowsheet.node(id).unwrap().center(), (500.0, 250.0));
}

#[test]
fn delete_key_removes_selection_and_undo_restores() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Valve", "V-1", (100.0, 100.0));
    let b = add(&mut app, "Valve", "V-2", (400.0, 100.0));
    app.flowsheet
        .connect(PortRef::output(a, 0), PortRef::input(b, 0))
        .unwrap();
    app.interaction.selected_nodes = vec![b];
    app.open_properties(b);

    let ctx = egui::Context::default();
    key_frame(&ctx, &mut app, egui::Key::Delete, egui::Modifiers::NONE);

    assert!(app.flowsheet.node(b).is_none());
    assert!(app.flowsheet.connections.is_empty());
    assert!(!app.interaction.show_properties);

    key_frame(&ctx, &mut app, egui::Key::Z, egui::Modifiers::COMMAND);
    assert!(app.flowsheet.node(b).is_some());
    assert_eq!(app.flowsheet.connections.len(), 1);
}

#[test]
fn ctrl_z_and_ctrl_y_undo_and_redo_add_unit() {
    let mut app = app_with_identity_canvas();
    let id = app.add_unit("Compressor").unwrap();

    let ctx = egui::Context::default();
    key_frame(&ctx, &mut app, egui::Key::Z, egui::Modifiers::COMMAND);
    assert!(app.flowsheet.node(id).is_none());

    key_frame(&ctx, &mut app, egui::Key::Y, egui::Modifiers::COMMAND);
    assert_eq!(app.flowsheet.node(id).unwrap().name, "Compressor 1");
}

#[test]
fn ctrl_a_selects_all_and_escape_cancels_connection() {
    let mut app = app_with_identity_canvas();
    add(&mut app, "Valve", "V-1", (100.0, 100.0));
    add(&mut app, "Valve", "V-2", (400.0, 100.0));

    let ctx = egui::Context::default();
    key_frame(&ctx, &mut app, egui::Key::A, egui::Modifiers::COMMAND);
    assert_eq!(app.interaction.selected_nodes.len(), 2);

    app.press((180.0, 125.0), egui::Modifiers::NONE, 0.0);
    assert!(app.interaction.pending_connection.is_some());
    key_frame(&ctx, &mut app, egui::Key::Escape, egui::Modifiers::NONE);
    assert!(app.interaction.pending_connection.is_none());
}

#[test]
fn enter_opens_properties_for_target() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    app.interaction.properties_target = Some(tank);

    let ctx = egui::Context::default();
    key_frame(&ctx, &mut app, egui::Key::Enter, egui::Modifiers::NONE);
    assert!(app.interaction.show_properties);
}

#[test]
fn ctrl_n_asks_before_discarding_changes() {
    let mut app = app_with_identity_canvas();
    app.add_unit("Tank").unwrap();

    let ctx = egui::Context::default();
    key_frame(&ctx, &mut app, egui::Key::N, egui::Modifiers::COMMAND);
    assert!(app.file.show_unsaved_dialog);
    assert_eq!(app.flowsheet.nodes.len(), 1);
}

#[test]
fn zoom_is_clamped_and_keeps_anchor_fixed() {
    let mut app = app_with_identity_canvas();
    let anchor = egui::pos2(300.0, 200.0);
    let before = app.screen_to_world(anchor);

    app.zoom_at(anchor, 10.0);
    assert_eq!(app.canvas.zoom_factor, 3.0);
    let after = app.screen_to_world(anchor);
    assert!((before - after).length() < 1e-3);

    app.zoom_at(anchor, 0.01);
    assert_eq!(app.canvas.zoom_factor, 0.25);

    app.reset_zoom();
    assert_eq!(app.canvas.zoom_factor, 1.0);
}

#[test]
fn press_respects_zoom_and_pan() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    app.canvas.zoom_factor = 2.0;
    app.canvas.offset = egui::vec2(50.0, 20.0);

    // World centre (160,180) lands at (370,380) on screen
    let screen = app.world_to_screen(egui::pos2(160.0, 180.0));
    assert_eq!(screen, egui::pos2(370.0, 380.0));

    let ctx = egui::Context::default();
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(screen)]);
    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(screen), button(screen, true)]);
    assert_eq!(app.interaction.selected_nodes, vec![tank]);
}

#[test]
fn first_canvas_frame_anchors_origin_to_canvas_corner() {
    let mut app = FlowsheetApp::default();
    let ctx = egui::Context::default();
    canvas_frame(&ctx, &mut app, vec![]);

    let rect = app.canvas.last_rect.unwrap();
    assert!(app.canvas.anchored);
    assert_eq!(app.canvas.offset, rect.min.to_vec2());
}

#[test]
fn properties_window_renames_with_undo() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    app.open_properties(tank);

    let ctx = egui::Context::default();
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    let _ = ctx.run(raw, |ctx| app.draw_properties_window(ctx));
    assert!(app.interaction.show_properties);

    app.interaction.temp_node_name = "  TK-100 ".to_string();
    app.commit_name_edit(tank);
    assert_eq!(app.flowsheet.node(tank).unwrap().name, "TK-100");

    // Blank names are refused
    app.interaction.temp_node_name = "   ".to_string();
    app.commit_name_edit(tank);
    assert_eq!(app.flowsheet.node(tank).unwrap().name, "TK-100");
    assert_eq!(app.interaction.temp_node_name, "TK-100");

    app.perform_undo();
    assert_eq!(app.flowsheet.node(tank).unwrap().name, "T-1");
}

#[test]
fn properties_window_closes_when_target_disappears() {
    let mut app = app_with_identity_canvas();
    let tank = app.add_unit("Tank").unwrap();
    app.open_properties(tank);

    app.perform_undo();
    assert!(!app.interaction.show_properties);
    assert_eq!(app.interaction.properties_target, None);
}

#[test]
fn panels_render_headless() {
    let mut app = app_with_identity_canvas();
    let a = app.add_unit("Inlet").unwrap();
    let b = app.add_unit("Valve").unwrap();
    app.flowsheet
        .connect(PortRef::output(a, 0), PortRef::input(b, 0))
        .unwrap();
    app.interaction.pending_connection = Some(state::PendingConnection {
        from: PortRef::output(b, 0),
        end: (500.0, 500.0),
    });
    app.interaction.marquee = Some(state::Marquee {
        start: (0.0, 0.0),
        end: (50.0, 50.0),
    });

    let ctx = egui::Context::default();
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    let _ = ctx.run(raw, |ctx| {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| app.draw_menu_bar(ui));
        egui::SidePanel::left("toolbar").show(ctx, |ui| app.draw_toolbar_tab(ui));
        egui::SidePanel::right("results").show(ctx, |ui| app.draw_results_tab(ui));
        egui::CentralPanel::default().show(ctx, |ui| app.draw_canvas(ui));
        app.draw_message_windows(ctx);
    });

    assert_eq!(app.flowsheet.nodes.len(), 2);
}

#[test]
fn reset_non_ui_fields_keeps_only_preferences() {
    let mut app = app_with_identity_canvas();
    app.add_unit("Tank").unwrap();
    app.theme = Theme::SoDarkAccentRed;
    app.canvas.show_grid = false;
    app.canvas.zoom_factor = 2.0;

    let json = app.to_json().unwrap();
    let restored = FlowsheetApp::restore(Some(json), AppConfig::default());

    assert!(restored.flowsheet.nodes.is_empty());
    assert!(!restored.undo_history.can_undo());
    assert_eq!(restored.theme, Theme::SoDarkAccentRed);
    assert!(!restored.canvas.show_grid);
    assert_eq!(restored.canvas.zoom_factor, 2.0);
    assert!(restored.dock_state.find_tab(&DockTab::Results).is_some());
}

#[test]
fn restore_falls_back_on_garbage() {
    let config = AppConfig {
        theme: Theme::PhotoshopStyle,
        ..AppConfig::default()
    };
    let app = FlowsheetApp::restore(Some("{ nope".to_string()), config);
    assert_eq!(app.theme, Theme::PhotoshopStyle);
    assert!(app.flowsheet.nodes.is_empty());
}

#[test]
fn exit_dialog_waits_for_an_answer() {
    let mut app = app_with_identity_canvas();
    app.dialogs.show_exit_dialog = true;

    let ctx = egui::Context::default();
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    let _ = ctx.run(raw, |ctx| app.draw_exit_dialog(ctx));

    assert!(app.dialogs.show_exit_dialog);
    assert!(!app.dialogs.allow_close_on_next_request);
}

#[test]
fn exit_warning_only_when_dirty() {
    let mut app = app_with_identity_canvas();
    assert_eq!(app.exit_warning(), None);
    app.add_unit("Tank").unwrap();
    assert_eq!(app.exit_warning(), Some("Unsaved changes will be lost."));
}

fn close_request_frame(ctx: &egui::Context, app: &mut FlowsheetApp) -> egui::FullOutput {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    raw.viewports.insert(
        egui::ViewportId::ROOT,
        egui::ViewportInfo {
            events: vec![egui::ViewportEvent::Close],
            ..Default::default()
        },
    );
    ctx.run(raw, |ctx| app.handle_close_request(ctx))
}

fn sent_command(output: &egui::FullOutput, command: &egui::ViewportCommand) -> bool {
    output
        .viewport_output
        .values()
        .any(|viewport| viewport.commands.contains(command))
}

#[test]
fn close_request_asks_first_then_closes_after_yes() {
    let mut app = app_with_identity_canvas();
    let ctx = egui::Context::default();

    let output = close_request_frame(&ctx, &mut app);
    assert!(app.dialogs.show_exit_dialog);
    assert!(sent_command(&output, &egui::ViewportCommand::CancelClose));

    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    let output = ctx.run(raw, |ctx| app.confirm_exit(ctx));
    assert!(!app.dialogs.show_exit_dialog);
    assert!(app.dialogs.allow_close_on_next_request);
    assert!(sent_command(&output, &egui::ViewportCommand::Close));

    // The close that follows is let through once
    let output = close_request_frame(&ctx, &mut app);
    assert!(!sent_command(&output, &egui::ViewportCommand::CancelClose));
    assert!(!app.dialogs.show_exit_dialog);
    assert!(!app.dialogs.allow_close_on_next_request);
}

#[test]
fn parameter_drag_is_one_undo_step() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));

    for value in [11.0, 12.5] {
        let original = app.flowsheet.node(tank).unwrap().parameters.clone();
        let mut edited = original.clone();
        edited[0].value = value;
        app.apply_parameter_edits(tank, &original, edited);
    }

    assert_eq!(app.flowsheet.node(tank).unwrap().parameters[0].value, 12.5);
    assert!(app.file.has_unsaved_changes);

    app.perform_undo();
    assert_eq!(app.flowsheet.node(tank).unwrap().parameters[0].value, 10.0);
    assert!(!app.undo_history.can_undo());

    app.perform_redo();
    assert_eq!(app.flowsheet.node(tank).unwrap().parameters[0].value, 12.5);
}

#[test]
fn specified_toggle_is_recorded() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));

    let original = app.flowsheet.node(tank).unwrap().parameters.clone();
    let mut edited = original.clone();
    edited[2].specified = false;
    app.apply_parameter_edits(tank, &original, edited);

    assert!(!app.flowsheet.node(tank).unwrap().parameters[2].specified);
    assert!(app.file.has_unsaved_changes);
    app.perform_undo();
    assert!(app.flowsheet.node(tank).unwrap().parameters[2].specified);
}

#[test]
fn unchanged_parameters_record_nothing() {
    let mut app = app_with_identity_canvas();
    let tank = add(&mut app, "Tank", "T-1", (100.0, 100.0));

    let original = app.flowsheet.node(tank).unwrap().parameters.clone();
    app.apply_parameter_edits(tank, &original, original.clone());

    assert!(!app.undo_history.can_undo());
    assert!(!app.file.has_unsaved_changes);
}

#[test]
fn switching_properties_target_keeps_typed_name() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    let b = add(&mut app, "Tank", "T-2", (400.0, 100.0));

    app.open_properties(a);
    app.interaction.temp_node_name = "Feed Tank".to_string();
    app.open_properties(b);

    assert_eq!(app.flowsheet.node(a).unwrap().name, "Feed Tank");
    assert_eq!(app.interaction.temp_node_name, "T-2");
    assert_eq!(app.interaction.temp_name_node, Some(b));
}

#[test]
fn retargeted_properties_window_commits_previous_name() {
    let mut app = app_with_identity_canvas();
    let a = add(&mut app, "Tank", "T-1", (100.0, 100.0));
    let b = add(&mut app, "Tank", "T-2", (400.0, 100.0));
    app.open_properties(a);
    app.interaction.temp_node_name = "Buffer".to_string();

    // A single click elsewhere moves the target without reopening
    app.interaction.properties_target = Some(b);
    let ctx = egui::Context::default();
    let mut raw = egui::RawInput::default();
    raw.screen_rect = screen();
    let _ = ctx.run(raw, |ctx| app.draw_properties_window(ctx));

    assert_eq!(app.flowsheet.node(a).unwrap().name, "Buffer");
    assert_eq!(app.interaction.temp_node_name, "T-2");
}

#[test]
fn exported_svg_matches_document() {
    let mut app = app_with_identity_canvas();
    app.add_unit("Splitter").unwrap();
    let (svg, _, _) = build_svg(&app.flowsheet);
    assert!(svg.contains("Splitter 1"));
    assert_eq!(svg.matches("<circle").count(), 4);
}
