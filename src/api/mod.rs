pub mod tuning_dto;
