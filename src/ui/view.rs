/// Widgets for the tagging screen
///
/// Pure functions of session state; every interaction is a `Message`.

use std::collections::HashMap;

use iced::widget::{
    button, center, column, container, horizontal_space, image, opaque, progress_bar, row,
    scrollable, stack, text, text_input, Column,
};
use iced::{Alignment, Color, ContentFit, Element, Length, Theme};

use crate::api::ImageAsset;
use crate::state::data::DisplayMode;
use crate::state::ledger::LedgerStatus;
use crate::state::resolution::{Outcome, PendingChallenge};
use crate::state::session::{Notice, Status, TaggingSession};
use crate::Message;

const SUCCESS: Color = Color::from_rgb(0.3, 0.8, 0.4);
const FAILURE: Color = Color::from_rgb(0.9, 0.3, 0.3);
const MUTED: Color = Color::from_rgb(0.6, 0.6, 0.6);
const PENDING: Color = Color::from_rgb(0.95, 0.8, 0.2);

pub type ImageCache = HashMap<ImageAsset, image::Handle>;

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

pub fn vin_input_id() -> text_input::Id {
    text_input::Id::new("vin-input")
}

/// Whole window: header, record list, image pane, and any open modal
pub fn screen<'a>(
    session: &'a TaggingSession,
    images: &'a ImageCache,
    confirm_delete: bool,
) -> Element<'a, Message> {
    let body = row![
        record_list(session),
        image_pane(session, images),
        vin_list(session)
    ]
        .spacing(20)
        .height(Length::Fill);

    let base = column![header(session), body]
        .spacing(16)
        .padding(20);

    if let Some(pending) = session.challenge() {
        modal(base, challenge_card(pending, images))
    } else if confirm_delete {
        let name = session
            .current()
            .map(|r| r.filename.as_str())
            .unwrap_or_default();
        modal(base, delete_card(name))
    } else {
        base.into()
    }
}

fn header(session: &TaggingSession) -> Element<'_, Message> {
    let progress = session.progress();

    let counts = text(format!(
        "{} / {} tagged ({:.1}%) · {} pending · {} of {} done this batch",
        progress.matched,
        progress.total,
        progress.percentage,
        progress.pending,
        progress.processed,
        progress.queued
    ))
    .size(14);

    let status_color = match session.status() {
        Status::Error | Status::LoadFailed => FAILURE,
        Status::AllProcessed => SUCCESS,
        _ => MUTED,
    };

    let reload = button(text("Reload"))
        .on_press_maybe((!session.is_busy() && !session.is_loading()).then_some(Message::Reload))
        .style(button::secondary);

    let ledger = match session.ledger().status() {
        LedgerStatus::Stale(reason) => text(format!("VIN sheet unavailable, counts from this batch ({})", reason))
            .size(12)
            .color(FAILURE),
        _ => text("").size(12),
    };

    column![
        row![
            text("VIN Tagger").size(28),
            horizontal_space(),
            text(session.status().to_string()).color(status_color),
            reload,
        ]
        .spacing(16)
        .align_y(Alignment::Center),
        progress_bar(0.0..=100.0, progress.percentage).height(Length::Fixed(8.0)),
        counts,
        ledger,
    ]
    .spacing(8)
    .into()
}

fn record_list(session: &TaggingSession) -> Element<'_, Message> {
    let cursor = session.queue().cursor();
    let records = session.queue().records();

    let entries = session.display_order().into_iter().map(|index| {
        let record = &records[index];
        let label = if session.is_processed(record) {
            format!("✓ {}", record.filename)
        } else {
            record.filename.clone()
        };
        let style: ButtonStyle = if cursor == Some(index) {
            button::primary
        } else {
            button::text
        };
        button(text(label).size(13))
            .width(Length::Fill)
            .style(style)
            .on_press(Message::Select(index))
            .into()
    });

    let mut list = column![text(format!("Images ({})", records.len())).size(16)].spacing(8);
    if let Some(dir) = session.processed_dir() {
        list = list.push(text(format!("Processed: {}", dir)).size(11).color(MUTED));
    }

    list.push(scrollable(Column::with_children(entries).spacing(2)).height(Length::Fill))
        .width(Length::Fixed(280.0))
        .into()
}

/// VINs from the sheet: matched (green) then pending (yellow)
fn vin_list(session: &TaggingSession) -> Element<'_, Message> {
    let ledger = session.ledger().snapshot();

    let body: Element<'_, Message> = if ledger.is_empty() {
        text("No VIN data available").size(13).color(MUTED).into()
    } else {
        let entries = ledger.entries().map(|(vin, matched)| {
            let dot = if matched { SUCCESS } else { PENDING };
            row![text("●").size(12).color(dot), text(vin).size(13)]
                .spacing(6)
                .align_y(Alignment::Center)
                .into()
        });
        scrollable(Column::with_children(entries).spacing(2))
            .height(Length::Fill)
            .into()
    };

    column![
        text(format!(
            "VINs ({} matched, {} pending)",
            ledger.matched().len(),
            ledger.pending().len()
        ))
        .size(16),
        body,
    ]
    .spacing(8)
    .width(Length::Fixed(200.0))
    .into()
}

fn image_pane<'a>(session: &'a TaggingSession, images: &'a ImageCache) -> Element<'a, Message> {
    let Some(record) = session.current() else {
        let empty = match session.status() {
            Status::Loading => "Loading data...",
            Status::LoadFailed => "Could not load images from the backend",
            _ => "No images found",
        };
        return center(text(empty).size(20)).into();
    };

    let shown = session
        .displayed()
        .map(|asset| picture(images.get(asset)))
        .unwrap_or_else(|| center(text("")).into());

    let navigable = !session.is_busy() && !session.is_loading();
    let editable = session.accepts_input();

    let position = session
        .queue()
        .cursor()
        .map(|i| format!("{} / {}", i + 1, session.queue().len()))
        .unwrap_or_default();

    let modes = DisplayMode::ALL.iter().fold(row![].spacing(6), |row, mode| {
        let style: ButtonStyle = if *mode == session.display_mode() {
            button::primary
        } else {
            button::secondary
        };
        let key = match mode {
            DisplayMode::Original => 1,
            DisplayMode::Inverted => 2,
        };
        row.push(
            button(text(format!("{} ({})", mode, key)).size(13))
                .style(style)
                .on_press_maybe(navigable.then_some(Message::SetMode(*mode))),
        )
    });

    let navigation = row![
        button(text("◀ Prev")).on_press_maybe(navigable.then_some(Message::Previous)),
        text(position),
        button(text("Next ▶")).on_press_maybe(navigable.then_some(Message::Next)),
        horizontal_space(),
        modes,
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let mut input = text_input("Last 6 of VIN", session.input())
        .id(vin_input_id())
        .size(22)
        .padding(10)
        .width(Length::Fixed(220.0));
    if editable {
        input = input
            .on_input(Message::InputChanged)
            .on_submit(Message::Submit);
    }

    let save_label = if session.status() == Status::Saving {
        "Saving..."
    } else {
        "Save"
    };

    let form = row![
        input,
        button(text(save_label))
            .padding(10)
            .style(button::primary)
            .on_press_maybe(editable.then_some(Message::Submit)),
        button(text("Delete"))
            .padding(10)
            .style(button::danger)
            .on_press_maybe(editable.then_some(Message::RequestDelete)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let notice: Element<'_, Message> = match session.notice() {
        Some(Notice::Success(msg)) => text(msg).color(SUCCESS).into(),
        Some(Notice::Error(msg)) => text(msg).color(FAILURE).into(),
        None => text("").into(),
    };

    column![
        text(&record.filename).size(16),
        shown,
        navigation,
        form,
        notice,
    ]
    .spacing(12)
    .width(Length::Fill)
    .into()
}

fn picture<'a>(handle: Option<&image::Handle>) -> Element<'a, Message> {
    match handle {
        Some(handle) => image::Image::<image::Handle>::new(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => center(text("Loading image...").color(MUTED)).into(),
    }
}

fn challenge_card<'a>(pending: &'a PendingChallenge, images: &'a ImageCache) -> Element<'a, Message> {
    let open = pending.is_open();
    let challenge = &pending.challenge;

    let choice = |label: &'a str, outcome: Outcome| {
        button(text(label)).on_press_maybe(open.then_some(Message::Resolve(outcome)))
    };

    let footer: Element<'_, Message> = if open {
        row![
            choice("Keep existing (1)", Outcome::KeepExisting).style(button::secondary),
            choice("Keep new (2)", Outcome::KeepNew).style(button::primary),
            horizontal_space(),
            choice("Cancel (Esc)", Outcome::Cancel).style(button::text),
        ]
        .spacing(10)
        .into()
    } else {
        text("Saving...").color(MUTED).into()
    };

    container(
        column![
            text(format!("VIN {} is already in use", challenge.candidate_vin)).size(22),
            row![
                side("Existing", &challenge.existing_file, images.get(&pending.existing_asset)),
                side("New", &challenge.new_file, images.get(&pending.new_asset)),
            ]
            .spacing(16),
            footer,
        ]
        .spacing(14),
    )
    .padding(20)
    .max_width(900)
    .style(container::rounded_box)
    .into()
}

fn side<'a>(title: &'a str, name: &'a str, handle: Option<&image::Handle>) -> Column<'a, Message> {
    column![
        text(title).size(16),
        text(name).size(12).color(MUTED),
        container(picture(handle)).height(Length::Fixed(320.0)),
    ]
    .spacing(6)
    .width(Length::Fill)
}

fn delete_card(filename: &str) -> Element<'_, Message> {
    container(
        column![
            text("Delete image?").size(22),
            text(filename).color(MUTED),
            row![
                button(text("Delete (y)"))
                    .style(button::danger)
                    .on_press(Message::ConfirmDelete),
                button(text("Cancel (n)"))
                    .style(button::secondary)
                    .on_press(Message::DismissDelete),
            ]
            .spacing(10),
        ]
        .spacing(14),
    )
    .padding(20)
    .style(container::rounded_box)
    .into()
}

fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(center(opaque(content)).style(|_theme| container::Style {
            background: Some(
                Color {
                    a: 0.8,
                    ..Color::BLACK
                }
                .into(),
            ),
            ..container::Style::default()
        }))
    ]
    .into()
}
