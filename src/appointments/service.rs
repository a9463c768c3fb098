use chrono::{Local, NaiveDate, NaiveDateTime};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::appointments::repository::AppointmentCriteria;
use crate::appointments::schedule;
use crate::appointments::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentRepository, AppointmentStatus,
    CreateAppointmentRequest, RescheduleRequest, SlotList,
};
use crate::auth::Actor;
use crate::notifications::{Notifier, Resource};
use crate::pagination::{PageRequest, PagedResult};
use crate::validation::normalize_optional;

/// Showroom wall-clock time; appointment dates carry no zone
fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Clone)]
pub struct AppointmentService {
    repo: AppointmentRepository,
    notifier: Notifier,
}

impl AppointmentService {
    pub fn new(repo: AppointmentRepository, notifier: Notifier) -> Self {
        Self { repo, notifier }
    }

    pub fn available_slots(&self, date: NaiveDate) -> SlotList {
        SlotList {
            date,
            slots: schedule::available_slots(date, local_now()),
        }
    }

    pub async fn create(
        &self,
        customer_id: i32,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if !self.repo.customer_exists(customer_id).await? {
            return Err(AppointmentError::CustomerNotFound);
        }
        if !self.repo.vehicle_available(request.vehicle_id).await? {
            return Err(AppointmentError::VehicleUnavailable);
        }
        if request.appointment_date <= local_now() {
            return Err(AppointmentError::DateNotInFuture);
        }
        if self
            .repo
            .slot_taken(customer_id, request.vehicle_id, request.appointment_date, None)
            .await?
        {
            return Err(AppointmentError::DuplicateSlot);
        }

        let id = self
            .repo
            .create(customer_id, request.vehicle_id, request.appointment_date)
            .await?;
        info!(
            "Customer {} booked vehicle {} at {} (appointment {})",
            customer_id, request.vehicle_id, request.appointment_date, id
        );
        let appointment = self.load(id).await?;
        self.notifier
            .broadcast(Resource::Appointment, "created", id, Some(&appointment));
        Ok(appointment)
    }

    /// Customers see their own appointments, staff see everyone's
    pub async fn list(
        &self,
        actor: Actor,
        filter: AppointmentFilter,
    ) -> Result<PagedResult<Appointment>, AppointmentError> {
        self.expire_stale().await?;

        let criteria = criteria_for(actor, &filter)?;
        let page = PageRequest {
            page: filter.page,
            page_size: filter.page_size,
        };
        debug!("Listing appointments with {:?}", criteria);
        let (items, total) = self.repo.list(&criteria, &page).await?;
        Ok(PagedResult::new(items, total, &page))
    }

    pub async fn get(&self, actor: Actor, id: i32) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(id).await?;
        if let Actor::Customer(customer_id) = actor {
            ensure_owner(&appointment, customer_id)?;
        }
        Ok(appointment)
    }

    pub async fn reschedule(
        &self,
        customer_id: i32,
        id: i32,
        request: RescheduleRequest,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_current(id).await?;
        ensure_owner(&appointment, customer_id)?;
        if appointment.status != AppointmentStatus::Pending {
            return Err(AppointmentError::NotReschedulable);
        }
        if request.appointment_date <= local_now() {
            return Err(AppointmentError::DateNotInFuture);
        }
        if self
            .repo
            .slot_taken(customer_id, appointment.vehicle_id, request.appointment_date, Some(id))
            .await?
        {
            return Err(AppointmentError::DuplicateSlot);
        }
        if !self
            .repo
            .reschedule(id, request.appointment_date, AppointmentStatus::Pending)
            .await?
        {
            return Err(AppointmentError::NotReschedulable);
        }

        info!("Appointment {} moved to {}", id, request.appointment_date);
        let updated = self.load(id).await?;
        self.notifier
            .broadcast(Resource::Appointment, "rescheduled", id, Some(&updated));
        Ok(updated)
    }

    pub async fn cancel(&self, customer_id: i32, id: i32) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_current(id).await?;
        ensure_owner(&appointment, customer_id)?;
        self.transition(appointment, AppointmentStatus::Cancelled).await
    }

    pub async fn approve(&self, id: i32) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_current(id).await?;
        self.transition(appointment, AppointmentStatus::Approve).await
    }

    pub async fn start(&self, id: i32) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_current(id).await?;
        if appointment.status == AppointmentStatus::Approve
            && !schedule::within_start_window(appointment.appointment_date, local_now())
        {
            return Err(AppointmentError::OutsideStartWindow);
        }
        self.transition(appointment, AppointmentStatus::Running).await
    }

    pub async fn complete(&self, id: i32) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(id).await?;
        self.transition(appointment, AppointmentStatus::Completed).await
    }

    /// Move overdue PENDING and APPROVE appointments to EXPIRED
    pub async fn expire_stale(&self) -> Result<usize, AppointmentError> {
        let now = local_now();
        let expired = self
            .repo
            .expire_stale(now, schedule::approved_expiry_cutoff(now))
            .await?;
        if !expired.is_empty() {
            info!("Expired {} appointments", expired.len());
            self.announce_expired(&expired);
        }
        Ok(expired.len())
    }

    fn announce_expired(&self, ids: &[i32]) {
        for id in ids {
            self.notifier.touch(Resource::Appointment, "expired", id);
        }
    }

    async fn transition(
        &self,
        appointment: Appointment,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = appointment.status;
        if !current.can_transition_to(next) {
            warn!("Rejected appointment {} transition {} -> {}", appointment.id, current, next);
            return Err(AppointmentError::InvalidTransition { from: current, to: next });
        }
        // Lost a race with another writer or the sweep
        if !self.repo.update_status(appointment.id, current, next).await? {
            let latest = self.load(appointment.id).await?;
            return Err(AppointmentError::InvalidTransition {
                from: latest.status,
                to: next,
            });
        }

        info!("Appointment {} {} -> {}", appointment.id, current, next);
        let updated = self.load(appointment.id).await?;
        self.notifier.broadcast(
            Resource::Appointment,
            "status_changed",
            updated.id,
            Some(&updated),
        );
        Ok(updated)
    }

    /// Load an appointment, expiring it first if its time has passed
    async fn load_current(&self, id: i32) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(id).await?;
        if schedule::is_overdue(appointment.status, appointment.appointment_date, local_now()) {
            self.expire_stale().await?;
            return self.load(id).await;
        }
        Ok(appointment)
    }

    async fn load(&self, id: i32) -> Result<Appointment, AppointmentError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound(id))
    }
}

fn ensure_owner(appointment: &Appointment, customer_id: i32) -> Result<(), AppointmentError> {
    if appointment.customer_id == customer_id {
        Ok(())
    } else {
        Err(AppointmentError::Forbidden(
            "You can only manage your own appointments".to_string(),
        ))
    }
}

fn criteria_for(actor: Actor, filter: &AppointmentFilter) -> Result<AppointmentCriteria, AppointmentError> {
    let status = match filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            AppointmentStatus::parse(raw).ok_or_else(|| AppointmentError::InvalidStatus(raw.to_string()))?,
        ),
        None => None,
    };
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(AppointmentError::InvalidDateRange);
        }
    }

    let (customer_id, customer_name) = match actor {
        Actor::Customer(id) => (Some(id), None),
        Actor::Dealer(_) | Actor::Admin => (None, normalize_optional(filter.customer_name.clone())),
    };

    Ok(AppointmentCriteria {
        customer_id,
        status,
        start_date: filter.start_date,
        end_date: filter.end_date,
        customer_name,
    })
}

/// Periodically run the expiry sweep until the runtime shuts down.
/// Periods shorter than a second are raised to one second.
pub fn spawn_expiry_sweep(service: AppointmentService, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.expire_stale().await {
                error!("Appointment expiry sweep failed: {}", err);
            }
        }
    })
}
