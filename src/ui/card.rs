/// One record on the review page: snapshot, parsed details and the
/// editable notes, usage and due date
use iced::widget::{column, container, image, pick_list, row, text, text_editor, text_input};
use iced::{Element, Length};

use super::Message;
use crate::import::bundle::{ImageBundle, ResolvedImage};
use crate::state::data::{status_label, Record, Usage, DATE_FORMAT};
use crate::state::edit::EditKey;

const IMAGE_WIDTH: f32 = 260.0;

fn detail<'a>(label: &'a str, value: String) -> Element<'a, Message> {
    row![text(format!("{}:", label)).size(13).width(100), text(value).size(13)]
        .spacing(6)
        .into()
}

pub fn view<'a>(
    key: &EditKey,
    record: &'a Record,
    images: &ImageBundle,
    notes: &'a text_editor::Content,
    due_date: &'a str,
) -> Element<'a, Message> {
    let snapshot: Element<'a, Message> = match images.resolve(record.image.as_deref()) {
        ResolvedImage::Found(data) => image(image::Handle::from_bytes(data.to_vec()))
            .width(IMAGE_WIDTH)
            .into(),
        ResolvedImage::NotFound => container(text(ResolvedImage::NOT_FOUND_TEXT))
            .width(IMAGE_WIDTH)
            .center_x(IMAGE_WIDTH)
            .into(),
    };

    let details = column![
        text(&record.clash_id).size(18),
        detail("Date Found", record.date_found.format(DATE_FORMAT).to_string()),
        detail("Main Zone", record.main_zone.clone()),
        detail("Sub Zone", record.sub_zone.clone()),
        detail("Level", record.level.clone()),
        detail("Discipline", record.discipline.clone()),
        detail("Description", record.description.clone()),
        detail("Issue Type", record.issue_type.clone()),
        detail("Status", status_label(record.status).to_string()),
        detail("Assign To", record.assign_to.clone()),
    ]
    .spacing(2)
    .width(Length::FillPortion(2));

    let notes_key = key.clone();
    let usage_key = key.clone();
    let due_key = key.clone();
    let submit_key = key.clone();

    let edits = column![
        text("Notes").size(13),
        text_editor(notes)
            .placeholder("Notes for this clash")
            .on_action(move |action| Message::NotesEdited(notes_key.clone(), action))
            .height(120),
        text("Usage").size(13),
        pick_list(Usage::ALL, Some(record.usage), move |usage| {
            Message::UsageSelected(usage_key.clone(), usage)
        }),
        text("Due Date").size(13),
        text_input("YYYY-MM-DD", due_date)
            .on_input(move |value| Message::DueDateChanged(due_key.clone(), value))
            .on_submit(Message::DueDateSubmitted(submit_key)),
    ]
    .spacing(4)
    .width(Length::FillPortion(3));

    container(row![snapshot, details, edits].spacing(16))
        .padding(12)
        .style(container::rounded_box)
        .width(Length::Fill)
        .into()
}
