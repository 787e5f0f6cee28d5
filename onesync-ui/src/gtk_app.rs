use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use gtk4::{gio, glib, prelude::*};
use libadwaita::prelude::*;

use crate::app::App;
use crate::settings::Settings;
use crate::ui_model::{Notice, UiStatus};

const APP_ID: &str = "io.github.onesync.WebDavOneFileSync";
const WINDOW_TITLE: &str = "WebDAV-One-File-Sync";

const ACTION_DOWNLOAD: &str = "action-download";
const ACTION_UPLOAD: &str = "action-upload";
const ACTION_RECHECK: &str = "action-recheck";
const ACTION_CONFIGURE: &str = "action-configure";
const ACTION_CHECK_CONNECTION: &str = "action-check-connection";
const ACTION_COPY: &str = "action-copy";

struct Widgets {
    window: libadwaita::ApplicationWindow,
    connection_label: gtk4::Label,
    local_label: gtk4::Label,
    remote_label: gtk4::Label,
}

pub fn run(app: App) -> Result<()> {
    libadwaita::init()?;
    install_css();

    let state = Rc::new(RefCell::new(app));
    let application = libadwaita::Application::builder()
        .application_id(APP_ID)
        .flags(gio::ApplicationFlags::NON_UNIQUE)
        .build();

    application.connect_activate(move |application| {
        let connection_label = status_label();
        let local_label = status_label();
        let remote_label = status_label();

        let labels = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
        labels.add_css_class("section-card");
        labels.append(&connection_label);
        labels.append(&local_label);
        labels.append(&remote_label);

        let buttons = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
        buttons.add_css_class("action-column");
        buttons.append(&action_button("Sync from remote", ACTION_DOWNLOAD));
        buttons.append(&action_button("Sync to remote", ACTION_UPLOAD));
        buttons.append(&action_button("Recheck", ACTION_RECHECK));
        buttons.append(&action_button("Configure WebDAV Options", ACTION_CONFIGURE));
        buttons.append(&action_button(
            "Check WebDAV Connection",
            ACTION_CHECK_CONNECTION,
        ));
        buttons.append(&action_button("Copy File to Folder", ACTION_COPY));

        let body = gtk4::Box::new(gtk4::Orientation::Vertical, 16);
        body.set_margin_start(18);
        body.set_margin_end(18);
        body.set_margin_top(12);
        body.set_margin_bottom(18);
        body.append(&labels);
        body.append(&buttons);

        let header = libadwaita::HeaderBar::builder()
            .title_widget(&gtk4::Label::new(Some(WINDOW_TITLE)))
            .build();

        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        content.append(&header);
        content.append(&body);

        let window = libadwaita::ApplicationWindow::builder()
            .application(application)
            .title(WINDOW_TITLE)
            .default_width(420)
            .default_height(460)
            .content(&content)
            .build();

        let widgets = Rc::new(Widgets {
            window: window.clone(),
            connection_label,
            local_label,
            remote_label,
        });
        refresh_ui(&widgets, &state.borrow());
        wire_actions(&buttons, Rc::clone(&widgets), Rc::clone(&state));
        window.present();

        let widgets = Rc::clone(&widgets);
        let state = Rc::clone(&state);
        glib::idle_add_local_once(move || {
            let notice = state.borrow_mut().startup();
            refresh_ui(&widgets, &state.borrow());
            if let Some(notice) = notice {
                show_notice(&widgets.window, &notice);
            }
        });
    });

    application.run_with_args::<&str>(&[]);
    Ok(())
}

fn status_label() -> gtk4::Label {
    let label = gtk4::Label::new(None);
    label.set_halign(gtk4::Align::Start);
    label.set_xalign(0.0);
    label.add_css_class("body-copy");
    label
}

fn action_button(title: &str, widget_name: &str) -> gtk4::Button {
    let button = gtk4::Button::with_label(title);
    button.set_widget_name(widget_name);
    button
}

fn wire_actions(root: &gtk4::Box, widgets: Rc<Widgets>, state: Rc<RefCell<App>>) {
    let notice_actions: [(&str, fn(&mut App) -> Notice); 3] = [
        (ACTION_DOWNLOAD, App::download),
        (ACTION_UPLOAD, App::upload),
        (ACTION_COPY, App::copy_to_folder),
    ];
    for (name, action) in notice_actions {
        if let Some(button) = find_button(root, name) {
            let widgets = Rc::clone(&widgets);
            let state = Rc::clone(&state);
            button.connect_clicked(move |_| {
                let notice = action(&mut state.borrow_mut());
                refresh_ui(&widgets, &state.borrow());
                show_notice(&widgets.window, &notice);
            });
        }
    }
    if let Some(button) = find_button(root, ACTION_RECHECK) {
        let widgets = Rc::clone(&widgets);
        let state = Rc::clone(&state);
        button.connect_clicked(move |_| {
            state.borrow_mut().recheck();
            refresh_ui(&widgets, &state.borrow());
        });
    }
    if let Some(button) = find_button(root, ACTION_CHECK_CONNECTION) {
        let widgets = Rc::clone(&widgets);
        let state = Rc::clone(&state);
        button.connect_clicked(move |_| {
            let notice = state.borrow_mut().check_connection();
            refresh_ui(&widgets, &state.borrow());
            if let Some(notice) = notice {
                show_notice(&widgets.window, &notice);
            }
        });
    }
    if let Some(button) = find_button(root, ACTION_CONFIGURE) {
        let widgets = Rc::clone(&widgets);
        let state = Rc::clone(&state);
        button.connect_clicked(move |_| {
            open_settings_form(Rc::clone(&widgets), Rc::clone(&state));
        });
    }
}

fn find_button(root: &gtk4::Box, widget_name: &str) -> Option<gtk4::Button> {
    fn search(widget: &gtk4::Widget, widget_name: &str) -> Option<gtk4::Button> {
        if widget.widget_name() == widget_name {
            return widget.clone().downcast::<gtk4::Button>().ok();
        }
        let mut child = widget.first_child();
        while let Some(current) = child {
            if let Some(found) = search(&current, widget_name) {
                return Some(found);
            }
            child = current.next_sibling();
        }
        None
    }
    search(root.as_ref(), widget_name)
}

/// Modal form with one entry per setting. Save applies and persists them.
fn open_settings_form(widgets: Rc<Widgets>, state: Rc<RefCell<App>>) {
    let current = state.borrow().settings().clone();

    let grid = gtk4::Grid::builder()
        .row_spacing(8)
        .column_spacing(12)
        .margin_start(18)
        .margin_end(18)
        .margin_top(18)
        .margin_bottom(12)
        .build();

    let mut entries = Vec::new();
    for (row, (key, value)) in (0..).zip(current.fields()) {
        let label = gtk4::Label::new(Some(&Settings::label(key)));
        label.set_halign(gtk4::Align::End);
        let entry = gtk4::Entry::builder().text(value).hexpand(true).build();
        if key == "password" {
            entry.set_visibility(false);
        }
        grid.attach(&label, 0, row, 1, 1);
        grid.attach(&entry, 1, row, 1, 1);
        entries.push((key, entry));
    }

    let save = gtk4::Button::with_label("Save");
    save.add_css_class("suggested-action");
    save.set_halign(gtk4::Align::End);
    save.set_margin_end(18);
    save.set_margin_bottom(18);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    content.append(&grid);
    content.append(&save);

    let dialog = gtk4::Window::builder()
        .title("Configure WebDAV Options")
        .modal(true)
        .transient_for(&widgets.window)
        .child(&content)
        .build();

    let form = dialog.clone();
    save.connect_clicked(move |_| {
        let mut updated = current.clone();
        for (key, entry) in &entries {
            if let Err(err) = updated.set(key, entry.text().as_str()) {
                tracing::warn!(key = *key, error = %err, "Ignoring unknown setting");
            }
        }
        let notice = state.borrow_mut().apply_settings(updated);
        refresh_ui(&widgets, &state.borrow());
        form.close();
        show_notice(&widgets.window, &notice);
    });

    dialog.present();
}

fn show_notice(window: &libadwaita::ApplicationWindow, notice: &Notice) {
    let dialog = libadwaita::MessageDialog::new(
        Some(window),
        Some(notice.title.as_str()),
        Some(notice.message.as_str()),
    );
    dialog.add_response("ok", "OK");
    dialog.set_default_response(Some("ok"));
    dialog.present();
}

fn refresh_ui(widgets: &Widgets, app: &App) {
    let status = app.status();
    widgets
        .connection_label
        .set_text(&status.connection_label());
    update_status_class(&widgets.connection_label, status.connection_status());
    widgets.local_label.set_text(&status.local_label());
    widgets.remote_label.set_text(&status.remote_label());
}

fn update_status_class(label: &gtk4::Label, status: UiStatus) {
    label.remove_css_class("status-ready");
    label.remove_css_class("status-error");
    label.remove_css_class("status-unknown");
    let class = match status {
        UiStatus::Ready => "status-ready",
        UiStatus::Error => "status-error",
        UiStatus::Unknown => "status-unknown",
    };
    label.add_css_class(class);
}

fn install_css() {
    let provider = gtk4::CssProvider::new();
    provider.load_from_data(
        ".section-card { padding: 14px; border-radius: 12px; background: alpha(@window_bg_color, 0.58); border: 1px solid alpha(@window_fg_color, 0.09); }\n\
         .body-copy { color: alpha(@window_fg_color, 0.94); }\n\
         .action-column > button { min-height: 34px; border-radius: 10px; padding: 0 12px; }\n\
         .status-ready { color: @success_color; font-weight: 600; }\n\
         .status-error { color: @error_color; font-weight: 600; }\n\
         .status-unknown { color: alpha(@window_fg_color, 0.7); }\n",
    );
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
