use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{db::user::User, mongodb::Id};

pub const DEFAULT_HOSTEL: &str = "Hostel-A";
pub const BLOCKS: [&str; 3] = ["Block-1", "Block-2", "Block-3"];
pub const FLOORS: [u8; 3] = [1, 2, 3];
pub const ROOMS_PER_FLOOR: u8 = 10;
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    Partial,
    Occupied,
}

impl RoomStatus {
    fn for_count(count: usize) -> Self {
        if count >= ROOM_CAPACITY {
            Self::Occupied
        } else if count > 0 {
            Self::Partial
        } else {
            Self::Available
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// `<block>-<number>`.
    pub id: String,
    pub block: String,
    pub floor: u8,
    pub number: String,
    pub capacity: usize,
    pub occupied: usize,
    pub status: RoomStatus,
    pub students: Vec<Occupant>,
}

/// Lay out every room of the hostel and place `students` by block and room.
///
/// Students whose block/room is outside the layout are not counted.
pub fn occupancy(students: &[User]) -> Vec<Room> {
    let mut by_room: HashMap<String, Vec<Occupant>> = HashMap::new();
    for student in students {
        if let (Some(block), Some(room)) = (&student.block, &student.room) {
            by_room
                .entry(format!("{block}-{room}"))
                .or_default()
                .push(Occupant {
                    id: student.id.clone(),
                    name: student.name.clone(),
                });
        }
    }

    let mut rooms = Vec::with_capacity(BLOCKS.len() * FLOORS.len() * ROOMS_PER_FLOOR as usize);
    for block in BLOCKS {
        for floor in FLOORS {
            for n in 1..=ROOMS_PER_FLOOR {
                let number = format!("{floor}{n:02}");
                let id = format!("{block}-{number}");
                let students = by_room.remove(&id).unwrap_or_default();
                rooms.push(Room {
                    block: block.to_string(),
                    floor,
                    number,
                    capacity: ROOM_CAPACITY,
                    occupied: students.len(),
                    status: RoomStatus::for_count(students.len()),
                    students,
                    id,
                });
            }
        }
    }
    rooms
}
