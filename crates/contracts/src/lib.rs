//! Общие типы, которыми обмениваются слои backend: агрегаты, значения настроек,
//! версии схемы и результаты запусков импорта.

pub mod domain;
pub mod shared;
pub mod system;
pub mod usecases;
