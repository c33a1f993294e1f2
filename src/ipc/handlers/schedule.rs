use crate::grid::{project_grid, upcoming_sessions, GridCell, WeekGrid};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    format_date, optional_date, optional_seed, optional_u32_in, parse_date, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::occupancy::RandomOccupancy;
use crate::slots::TIME_FORMAT;
use crate::week::{weekday_name, WeekWindow};
use chrono::{Datelike, Local, NaiveDate};
use serde_json::{json, Value};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn window_json(window: &WeekWindow, today: NaiveDate) -> Value {
    let days: Vec<Value> = window
        .days()
        .iter()
        .map(|d| {
            json!({
                "date": format_date(*d),
                "dayOfWeek": d.weekday().num_days_from_sunday(),
                "weekday": weekday_name(d.weekday()),
                "isToday": *d == today,
            })
        })
        .collect();
    json!({
        "start": format_date(window.start()),
        "end": format_date(window.end()),
        "weekStartsOn": weekday_name(window.week_starts_on()),
        "containsToday": window.contains(today),
        "days": days,
    })
}

fn out_of_range(date: NaiveDate) -> HandlerErr {
    HandlerErr::bad_params("week falls outside the supported calendar")
        .with_details(json!({ "date": format_date(date) }))
}

fn cell_json(hour: u32, cell: &GridCell<'_>) -> Value {
    let slot = cell.slot();
    json!({
        "slotId": slot.id(),
        "hour": hour,
        "startTime": slot.start().format(TIME_FORMAT).to_string(),
        "endTime": slot.end().format(TIME_FORMAT).to_string(),
        "enrolledCount": cell.enrolled_count(),
        "capacity": slot.capacity(),
        "availableSeats": cell.available_seats(),
        "isFull": cell.is_full(),
        "status": cell.status(),
    })
}

fn grid_json(grid: &WeekGrid<'_>, today: NaiveDate) -> Value {
    let hours = grid.hours();
    let days: Vec<Value> = grid
        .window()
        .days()
        .iter()
        .enumerate()
        .map(|(d, date)| {
            let cells: Vec<Value> = hours
                .iter()
                .zip(grid.column(d))
                .map(|(hour, c)| c.as_ref().map_or(Value::Null, |c| cell_json(hour, c)))
                .collect();
            json!({
                "date": format_date(*date),
                "dayOfWeek": date.weekday().num_days_from_sunday(),
                "cells": cells,
            })
        })
        .collect();
    let hour_labels: Vec<String> = hours.iter().map(|h| format!("{:02}:00", h)).collect();
    json!({
        "week": window_json(grid.window(), today),
        "hours": {
            "first": hours.first(),
            "last": hours.last(),
            "rows": hours.len(),
            "labels": hour_labels,
        },
        "days": days,
        "summary": grid.summary(),
    })
}

/// Window for an explicit `date` param, else the cursor's current week.
fn requested_window(state: &AppState, req: &Request) -> Result<WeekWindow, HandlerErr> {
    let week_starts_on = state.settings.schedule().week_starts_on;
    match optional_date(req, "date")? {
        Some(d) => WeekWindow::containing(d, week_starts_on).ok_or_else(|| out_of_range(d)),
        None => state
            .cursor
            .window()
            .ok_or_else(|| out_of_range(state.cursor.reference())),
    }
}

pub(crate) fn sampler_for(req: &Request) -> Result<RandomOccupancy<rand::rngs::StdRng>, HandlerErr> {
    Ok(match optional_seed(req)? {
        Some(seed) => RandomOccupancy::seeded(seed),
        None => RandomOccupancy::from_entropy(),
    })
}

fn handle_week(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let window = requested_window(state, req)?;
    Ok(json!({
        "reference": format_date(state.cursor.reference()),
        "week": window_json(&window, today()),
    }))
}

fn handle_navigate(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let direction = required_str(req, "direction")?;
    let moved = match direction.as_str() {
        "next" => state.cursor.next_week(),
        "previous" | "prev" => state.cursor.previous_week(),
        "today" => state.cursor.jump_to_today(today()),
        _ => {
            return Err(HandlerErr::bad_params(
                "direction must be one of: next, previous, today",
            ))
        }
    };
    let window = moved.ok_or_else(|| out_of_range(state.cursor.reference()))?;
    log::debug!("navigated {} to week of {}", direction, window.start());
    Ok(json!({
        "reference": format_date(state.cursor.reference()),
        "week": window_json(&window, today()),
    }))
}

fn handle_grid(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let window = requested_window(state, req)?;
    let mut sampler = sampler_for(req)?;
    let hours = state.settings.schedule().hours;
    let grid = project_grid(&window, state.registry.as_slice(), hours, &mut sampler);
    Ok(grid_json(&grid, today()))
}

fn handle_events(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let window = requested_window(state, req)?;
    let mut sampler = sampler_for(req)?;
    let schedule = state.settings.schedule();
    let grid = project_grid(&window, state.registry.as_slice(), schedule.hours, &mut sampler);
    let events: Vec<Value> = grid
        .events(&schedule.class_title)
        .into_iter()
        .map(|e| {
            json!({
                "id": e.id,
                "slotId": e.slot_id,
                "title": e.title,
                "start": e.start.format(DATETIME_FORMAT).to_string(),
                "end": e.end.format(DATETIME_FORMAT).to_string(),
                "enrolledCount": e.enrolled_count,
                "capacity": e.capacity,
                "status": e.status,
            })
        })
        .collect();
    Ok(json!({ "week": window_json(&window, today()), "events": events }))
}

/// Cell-click callback from the shell: resolves the slot for the clicked date
/// so the caller can open its enrollment dialog.
fn handle_slot_click(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let slot_id = required_str(req, "slotId")?;
    let date = parse_date(&required_str(req, "date")?, "date")?;
    let slot = state
        .registry
        .get(&slot_id)
        .ok_or_else(|| HandlerErr::new("not_found", "slot not found"))?;
    if !slot.occurs_on(date) {
        return Err(HandlerErr::bad_params(format!(
            "slot {} does not run on {}",
            slot_id,
            format_date(date)
        )));
    }
    let user = state
        .session
        .as_ref()
        .map(|s| s.user().email.clone())
        .unwrap_or_default();
    log::info!("slot {} on {} selected by {}", slot_id, date, user);
    Ok(json!({
        "slotId": slot.id(),
        "date": format_date(date),
        "startTime": slot.start().format(TIME_FORMAT).to_string(),
        "endTime": slot.end().format(TIME_FORMAT).to_string(),
        "durationMinutes": slot.duration_minutes(),
        "capacity": slot.capacity(),
        "teacherId": slot.teacher_id(),
    }))
}

/// Dashboard list of the next sessions across the whole registry.
fn handle_upcoming(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let limit = optional_u32_in(req, "limit", 5, 1, 50)?;
    let days = optional_u32_in(req, "days", 7, 1, 60)?;
    let mut sampler = sampler_for(req)?;
    let now = Local::now().naive_local();
    let sessions: Vec<Value> = upcoming_sessions(
        state.registry.as_slice(),
        now,
        days,
        limit as usize,
        &mut sampler,
    )
    .iter()
    .map(|c| session_json(state, c))
    .collect();
    Ok(json!({ "sessions": sessions }))
}

pub(crate) fn session_json(state: &AppState, cell: &GridCell<'_>) -> Value {
    let slot = cell.slot();
    let teacher = slot
        .teacher_id()
        .and_then(|id| state.directory.find_by_id(id))
        .map(|u| u.name.clone());
    json!({
        "slotId": slot.id(),
        "date": format_date(cell.date()),
        "weekday": weekday_name(cell.date().weekday()),
        "startTime": slot.start().format(TIME_FORMAT).to_string(),
        "endTime": slot.end().format(TIME_FORMAT).to_string(),
        "teacher": teacher,
        "enrolledCount": cell.enrolled_count(),
        "capacity": slot.capacity(),
        "isFull": cell.is_full(),
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "schedule.week" => handle_week(state, req),
        "schedule.navigate" => handle_navigate(state, req),
        "schedule.grid" => handle_grid(state, req),
        "schedule.events" => handle_events(state, req),
        "schedule.slotClick" => handle_slot_click(state, req),
        "schedule.upcoming" => handle_upcoming(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
